use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use oscbatch_core::{DatagramTransport, Relay, RelayConfig, TransportError};

/// Transport that replays a fixed list of datagrams and records every send.
/// When the script runs out it trips the stop flag, the way an operator
/// would stop the process once the stream ends.
struct ScriptTransport {
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    stop: Arc<AtomicBool>,
}

impl ScriptTransport {
    fn new(inbound: Vec<Vec<u8>>, stop: Arc<AtomicBool>) -> Self {
        Self {
            inbound: inbound.into(),
            sent: Vec::new(),
            stop,
        }
    }
}

impl DatagramTransport for ScriptTransport {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        match self.inbound.pop_front() {
            Some(datagram) => {
                let len = datagram.len().min(buf.len());
                buf[..len].copy_from_slice(&datagram[..len]);
                Ok(Some(len))
            }
            None => {
                self.stop.store(true, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.sent.push(payload.to_vec());
        Ok(())
    }
}

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

fn accel_config(strict: bool) -> RelayConfig {
    let strict = if strict { "true" } else { "false" };
    RelayConfig::from_json_str(&format!(
        r#"{{
            "listen": "127.0.0.1:9000",
            "destination": "127.0.0.1:57120",
            "in_address": "/accel",
            "floats_per_msg": 3,
            "msgs_per_blob": 4,
            "strict": {strict}
        }}"#
    ))
    .expect("config json")
}

fn run_relay(config: &RelayConfig, inbound: Vec<Vec<u8>>) -> (Relay, Vec<Vec<u8>>) {
    let stop = Arc::new(AtomicBool::new(false));
    let mut transport = ScriptTransport::new(inbound, Arc::clone(&stop));
    let mut relay = Relay::new(config).expect("relay");
    relay.run(&mut transport, &stop, None);
    (relay, transport.sent)
}

#[test]
fn accel_scenario_emits_one_blob_with_the_twelve_floats() {
    let inbound = vec![
        osc_float_msg("/accel", &[1.0, 2.0, 3.0]),
        osc_float_msg("/accel", &[4.0, 5.0, 6.0]),
        osc_float_msg("/accel", &[7.0, 8.0, 9.0]),
        osc_float_msg("/accel", &[10.0, 11.0, 12.0]),
    ];
    let (relay, sent) = run_relay(&accel_config(false), inbound);

    assert_eq!(sent.len(), 1);
    let packet = &sent[0];
    assert_eq!(packet.len(), 64);
    assert_eq!(&packet[..8], b"/accel\0\0");
    assert_eq!(&packet[8..12], b",b\0\0");
    assert_eq!(&packet[12..16], &48i32.to_be_bytes());

    let floats: Vec<f32> = packet[16..]
        .chunks(4)
        .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    let expected: Vec<f32> = (1..=12).map(|n| n as f32).collect();
    assert_eq!(floats, expected);

    assert_eq!(relay.stats().datagrams_received, 4);
    assert_eq!(relay.stats().blobs_sent, 1);
    assert_eq!(relay.stats().bytes_sent, 64);
}

#[test]
fn partial_accumulation_emits_nothing() {
    let inbound = vec![
        osc_float_msg("/accel", &[1.0, 2.0, 3.0]),
        osc_float_msg("/accel", &[4.0, 5.0, 6.0]),
        osc_float_msg("/accel", &[7.0, 8.0, 9.0]),
    ];
    let (relay, sent) = run_relay(&accel_config(false), inbound);

    assert!(sent.is_empty());
    assert_eq!(relay.stats().flushes, 0);
}

#[test]
fn short_datagrams_never_trigger_or_feed_a_flush() {
    let inbound = vec![
        osc_float_msg("/accel", &[1.0, 2.0, 3.0]),
        vec![0u8; 27],
        osc_float_msg("/accel", &[4.0, 5.0, 6.0]),
        vec![],
        osc_float_msg("/accel", &[7.0, 8.0, 9.0]),
    ];
    let (relay, sent) = run_relay(&accel_config(false), inbound);
    assert!(sent.is_empty());
    assert_eq!(relay.stats().datagrams_too_short, 2);

    let inbound = vec![
        osc_float_msg("/accel", &[1.0, 2.0, 3.0]),
        vec![0u8; 27],
        osc_float_msg("/accel", &[4.0, 5.0, 6.0]),
        osc_float_msg("/accel", &[7.0, 8.0, 9.0]),
        osc_float_msg("/accel", &[10.0, 11.0, 12.0]),
    ];
    let (relay, sent) = run_relay(&accel_config(false), inbound);
    assert_eq!(sent.len(), 1);
    assert_eq!(relay.stats().datagrams_received, 5);
    assert_eq!(relay.stats().datagrams_too_short, 1);
}

#[test]
fn boundary_datagram_is_accepted_one_byte_short_is_not() {
    let exact = osc_float_msg("/accel", &[1.0, 2.0, 3.0]);
    assert_eq!(exact.len(), 28);
    let mut short = exact.clone();
    short.pop();

    let (relay, _) = run_relay(&accel_config(false), vec![exact, short]);
    assert_eq!(relay.stats().datagrams_received, 2);
    assert_eq!(relay.stats().datagrams_too_short, 1);
}

#[test]
fn strict_mode_drops_foreign_addresses() {
    let inbound = vec![
        osc_float_msg("/accel", &[1.0, 2.0, 3.0]),
        osc_float_msg("/gyro", &[0.1, 0.2, 0.3]),
        osc_float_msg("/accel", &[4.0, 5.0, 6.0]),
        osc_float_msg("/accel", &[7.0, 8.0, 9.0]),
        osc_float_msg("/accel", &[10.0, 11.0, 12.0]),
    ];
    let (relay, sent) = run_relay(&accel_config(true), inbound);

    assert_eq!(relay.stats().datagrams_unmatched, 1);
    assert_eq!(sent.len(), 1);
    let floats: Vec<f32> = sent[0][16..]
        .chunks(4)
        .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    assert_eq!(floats, (1..=12).map(|n| n as f32).collect::<Vec<f32>>());
}

#[test]
fn trusting_mode_accepts_foreign_addresses_at_fixed_offsets() {
    // "/gyro" pads to the same 8-byte block as "/accel", so its floats land
    // at the same offset and the trusting decoder relays them.
    let inbound = vec![
        osc_float_msg("/gyro", &[1.0, 2.0, 3.0]),
        osc_float_msg("/accel", &[4.0, 5.0, 6.0]),
        osc_float_msg("/accel", &[7.0, 8.0, 9.0]),
        osc_float_msg("/accel", &[10.0, 11.0, 12.0]),
    ];
    let (relay, sent) = run_relay(&accel_config(false), inbound);
    assert_eq!(relay.stats().datagrams_unmatched, 0);
    assert_eq!(sent.len(), 1);
}

#[test]
fn outbound_prefix_is_identical_across_flushes() {
    let inbound = (0..12)
        .map(|n| osc_float_msg("/accel", &[n as f32, 0.0, 0.0]))
        .collect();
    let (relay, sent) = run_relay(&accel_config(false), inbound);

    assert_eq!(sent.len(), 3);
    assert_eq!(relay.stats().flushes, 3);
    for packet in &sent {
        assert_eq!(&packet[..12], &sent[0][..12]);
        assert_eq!(&packet[12..16], &48i32.to_be_bytes());
    }
    assert_ne!(&sent[0][16..], &sent[1][16..]);

    // Arrival order is preserved across the blob boundary.
    let first_float_of_second_blob =
        f32::from_be_bytes([sent[1][16], sent[1][17], sent[1][18], sent[1][19]]);
    assert_eq!(first_float_of_second_blob, 4.0);
}

#[test]
fn distinct_out_address_rewrites_the_prefix() {
    let config = RelayConfig::from_json_str(
        r#"{
            "listen": "127.0.0.1:9000",
            "destination": "127.0.0.1:57120",
            "in_address": "/accel",
            "out_address": "/batched",
            "floats_per_msg": 3,
            "msgs_per_blob": 4
        }"#,
    )
    .expect("config json");

    let inbound = (0..4)
        .map(|n| osc_float_msg("/accel", &[n as f32, 0.0, 0.0]))
        .collect();
    let (_, sent) = run_relay(&config, inbound);

    assert_eq!(sent.len(), 1);
    // "/batched" pads to 12 bytes, shifting the type tags and blob.
    assert_eq!(&sent[0][..12], b"/batched\0\0\0\0");
    assert_eq!(&sent[0][12..16], b",b\0\0");
    assert_eq!(&sent[0][16..20], &48i32.to_be_bytes());
}
