use std::net::UdpSocket;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use oscbatch_core::{Relay, RelayConfig, UdpTransport};

fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

fn osc_float_msg(address: &str, floats: &[f32]) -> Vec<u8> {
    let mut tags = String::from(",");
    for _ in floats {
        tags.push('f');
    }
    let addr_block = pad4(address.len() + 1);
    let tag_block = pad4(tags.len() + 1);
    let mut msg = vec![0u8; addr_block + tag_block + 4 * floats.len()];
    msg[..address.len()].copy_from_slice(address.as_bytes());
    msg[addr_block..addr_block + tags.len()].copy_from_slice(tags.as_bytes());
    let mut offset = addr_block + tag_block;
    for value in floats {
        msg[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        offset += 4;
    }
    msg
}

#[test]
fn relays_one_blob_over_loopback_sockets() {
    let downstream = UdpSocket::bind("127.0.0.1:0").expect("bind downstream");
    downstream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("set timeout");
    let destination = downstream.local_addr().expect("downstream addr");

    let mut transport = UdpTransport::bind(
        "127.0.0.1:0".parse().expect("listen addr"),
        destination,
        Some(Duration::from_millis(50)),
    )
    .expect("bind transport");
    let listen = transport.local_addr().expect("local addr");

    let config = RelayConfig::from_json_str(&format!(
        r#"{{
            "listen": "{listen}",
            "destination": "{destination}",
            "in_address": "/accel",
            "floats_per_msg": 3,
            "msgs_per_blob": 4
        }}"#
    ))
    .expect("config json");
    let mut relay = Relay::new(&config).expect("relay");

    let handle = thread::spawn(move || {
        let stop = AtomicBool::new(false);
        relay.run(&mut transport, &stop, Some(1));
        relay
    });

    let sender = UdpSocket::bind("127.0.0.1:0").expect("bind sender");
    for n in 0..4 {
        let floats = [3.0 * n as f32 + 1.0, 3.0 * n as f32 + 2.0, 3.0 * n as f32 + 3.0];
        sender
            .send_to(&osc_float_msg("/accel", &floats), listen)
            .expect("send datagram");
    }

    let mut buf = [0u8; 128];
    let (len, _) = downstream.recv_from(&mut buf).expect("receive blob");
    assert_eq!(len, 64);
    assert_eq!(&buf[..8], b"/accel\0\0");
    assert_eq!(&buf[8..12], b",b\0\0");
    assert_eq!(&buf[12..16], &48i32.to_be_bytes());
    let floats: Vec<f32> = buf[16..64]
        .chunks(4)
        .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    assert_eq!(floats, (1..=12).map(|n| n as f32).collect::<Vec<f32>>());

    let relay = handle.join().expect("join relay thread");
    assert_eq!(relay.stats().blobs_sent, 1);
    assert_eq!(relay.stats().datagrams_received, 4);
}

#[test]
fn idle_socket_times_out_without_a_datagram() {
    let mut transport = UdpTransport::bind(
        "127.0.0.1:0".parse().expect("listen addr"),
        "127.0.0.1:9".parse().expect("destination addr"),
        Some(Duration::from_millis(20)),
    )
    .expect("bind transport");

    use oscbatch_core::DatagramTransport;
    let mut buf = [0u8; 64];
    assert!(matches!(transport.recv(&mut buf), Ok(None)));
}
