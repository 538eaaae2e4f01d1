//! The relay loop: receive, decode, accumulate, flush.
//!
//! One thread owns the transport, the accumulator and the outbound packet
//! buffer for the lifetime of the run. All per-datagram failures (empty
//! receive, short datagram, strict-mode mismatch, failed send) are dropped
//! silently and counted; only startup configuration problems are errors.

mod accumulator;

pub use accumulator::Accumulator;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{ConfigError, RelayConfig};
use crate::protocols::osc::{BlobPacket, PacketLayout, decode_args};
use crate::transport::DatagramTransport;

/// Counters aggregated while the relay loop runs.
#[derive(Debug, Default, Clone)]
pub struct RelayStats {
    pub datagrams_received: u64,
    pub datagrams_too_short: u64,
    pub datagrams_unmatched: u64,
    pub recv_failures: u64,
    pub flushes: u64,
    pub blobs_sent: u64,
    pub send_failures: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Single-threaded batching relay over a datagram transport.
///
/// All buffers are sized once at construction from the validated
/// configuration; the loop performs no allocation per datagram.
pub struct Relay {
    layout: PacketLayout,
    strict: bool,
    accumulator: Accumulator,
    packet: BlobPacket,
    recv_buf: Vec<u8>,
    stats: RelayStats,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Result<Self, ConfigError> {
        let layout = config.validate()?;
        let accumulator = Accumulator::new(layout.blob_len);
        let packet = BlobPacket::new(&layout);
        let recv_buf = vec![0u8; config.recv_buffer_bytes];
        Ok(Self {
            layout,
            strict: config.strict,
            accumulator,
            packet,
            recv_buf,
            stats: RelayStats::default(),
        })
    }

    pub fn layout(&self) -> &PacketLayout {
        &self.layout
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Drive the relay until `stop` is set or `max_blobs` flushes have
    /// happened (`None` = no flush budget).
    ///
    /// The stop flag is checked once per iteration before the blocking
    /// receive; pair it with a transport read timeout so an idle socket
    /// still observes it. Receive errors and timeouts are treated as "no
    /// datagram this iteration". Send failures are counted but otherwise
    /// ignored, and the accumulator is reset regardless: data in a failed
    /// flush is dropped, not retried, consistent with best-effort UDP.
    pub fn run<T: DatagramTransport>(
        &mut self,
        transport: &mut T,
        stop: &AtomicBool,
        max_blobs: Option<u64>,
    ) {
        while !stop.load(Ordering::Relaxed) {
            if let Some(limit) = max_blobs {
                if self.stats.flushes >= limit {
                    break;
                }
            }

            let len = match transport.recv(&mut self.recv_buf) {
                Ok(Some(len)) => len,
                Ok(None) => continue,
                Err(_) => {
                    self.stats.recv_failures += 1;
                    continue;
                }
            };
            self.stats.datagrams_received += 1;
            self.stats.bytes_received += len as u64;

            let args = match decode_args(&self.recv_buf[..len], &self.layout, self.strict) {
                Ok(Some(args)) => args,
                Ok(None) => {
                    self.stats.datagrams_unmatched += 1;
                    continue;
                }
                Err(_) => {
                    self.stats.datagrams_too_short += 1;
                    continue;
                }
            };
            self.accumulator.append(args);

            if self.accumulator.is_full() {
                let packet = self.packet.encode(self.accumulator.bytes());
                match transport.send(packet) {
                    Ok(()) => {
                        self.stats.blobs_sent += 1;
                        self.stats.bytes_sent += packet.len() as u64;
                    }
                    Err(_) => self.stats.send_failures += 1,
                }
                self.stats.flushes += 1;
                self.accumulator.reset();
            }
        }
    }
}
