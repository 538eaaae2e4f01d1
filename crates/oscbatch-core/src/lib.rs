//! Core library for batching relays over fixed-shape OSC streams.
//!
//! This crate implements the relay pipeline used by the CLI: a datagram
//! transport feeds the relay loop, which drives the OSC decoder
//! (layout/reader/parser), a fixed-capacity accumulator and the blob
//! encoder, and aggregates traffic counters into a deterministic report.
//! Decoding and encoding are byte-oriented and side-effect free; all I/O
//! is isolated in `transport` modules. Wire conventions are captured in
//! the layout so parser and encoder stay minimal.
//!
//! Invariants:
//! - All offsets and buffer capacities are derived once at startup from a
//!   validated configuration; the per-datagram path never allocates.
//! - Argument bytes are relayed bit-for-bit in strict arrival order;
//!   rejected datagrams never consume an accumulator slot.
//! - The outbound packet buffer's address and type-tag blocks are written
//!   once and reused across every flush.
//!
//! Version française (résumé):
//! Cette crate fournit le cœur du relais : transport -> boucle de relais
//! -> décodeur OSC (layout/reader/parser) -> accumulateur -> encodeur de
//! blob. Les E/S restent dans `transport`, les conventions du format dans
//! `layout`. Garanties : offsets et capacités calculés une seule fois au
//! démarrage, octets relayés tels quels dans l'ordre d'arrivée, tampon
//! sortant réutilisé à chaque envoi.
//!
//! # Examples
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//!
//! use oscbatch_core::{Relay, RelayConfig, UdpTransport};
//!
//! let config = RelayConfig::from_json_str(
//!     r#"{
//!         "listen": "127.0.0.1:9000",
//!         "destination": "127.0.0.1:57120",
//!         "in_address": "/accel",
//!         "floats_per_msg": 3,
//!         "msgs_per_blob": 4
//!     }"#,
//! )?;
//! let mut transport = UdpTransport::bind(
//!     config.listen_addr()?,
//!     config.destination_addr()?,
//!     Some(Duration::from_millis(250)),
//! )?;
//! let mut relay = Relay::new(&config)?;
//! let stop = AtomicBool::new(false);
//! relay.run(&mut transport, &stop, None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

mod config;
mod protocols;
mod relay;
mod transport;

pub use config::{ConfigError, DEFAULT_MAX_PACKET_BYTES, DEFAULT_RECV_BUFFER_BYTES, RelayConfig};
pub use protocols::osc::{BlobPacket, MessageShape, OscError, PacketLayout, decode_args, pad4};
pub use relay::{Accumulator, Relay, RelayStats};
pub use transport::{DatagramTransport, TransportError, UdpTransport};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the current time cannot be formatted.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use oscbatch_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "oscbatch".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "oscbatch");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "oscbatch").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Traffic counters of one relay run, in report form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSummary {
    /// Datagrams received from the transport.
    pub datagrams_received: u64,
    /// Datagrams dropped for being shorter than the minimum length.
    pub datagrams_too_short: u64,
    /// Datagrams dropped by strict-mode header verification.
    pub datagrams_unmatched: u64,
    /// Receive calls that reported a transient error.
    pub recv_failures: u64,
    /// Accumulator flushes (send attempts).
    pub flushes: u64,
    /// Blob packets sent successfully.
    pub blobs_sent: u64,
    /// Flushes whose send failed; the data was dropped, not retried.
    pub send_failures: u64,
    /// Payload bytes received.
    pub bytes_received: u64,
    /// Packet bytes sent.
    pub bytes_sent: u64,
}

/// Shutdown summary of one relay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,
    /// Listen endpoint as configured.
    pub listen: String,
    /// Destination endpoint as configured.
    pub destination: String,
    /// Inbound OSC address pattern.
    pub in_address: String,
    /// Outbound OSC address pattern.
    pub out_address: String,
    /// Aggregated traffic counters.
    pub traffic: TrafficSummary,
}

/// Computed packet layout in report form, for configuration inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Inbound OSC address pattern.
    pub in_address: String,
    /// Inbound type-tag string (one `f` per float).
    pub in_type_tags: String,
    /// Byte offset of the float arguments in an inbound datagram.
    pub in_args_offset: usize,
    /// Byte length of the float arguments.
    pub in_args_len: usize,
    /// Minimum accepted inbound datagram length.
    pub in_min_datagram: usize,
    /// Outbound OSC address pattern.
    pub out_address: String,
    /// Byte offset of the blob-size field in the outbound packet.
    pub blob_size_offset: usize,
    /// Byte offset of the blob data in the outbound packet.
    pub blob_data_offset: usize,
    /// Blob data length in bytes.
    pub blob_len: usize,
    /// Total outbound packet length in bytes.
    pub out_packet_len: usize,
    /// Configured packet length limit.
    pub max_packet_bytes: usize,
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "oscbatch".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn now_rfc3339() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

/// Build the shutdown report for a finished relay run.
pub fn build_relay_report(config: &RelayConfig, stats: &RelayStats) -> RelayReport {
    RelayReport {
        report_version: REPORT_VERSION,
        tool: tool_info(),
        generated_at: now_rfc3339().unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string()),
        listen: config.listen.clone(),
        destination: config.destination.clone(),
        in_address: config.in_address.clone(),
        out_address: config.out_address().to_string(),
        traffic: TrafficSummary {
            datagrams_received: stats.datagrams_received,
            datagrams_too_short: stats.datagrams_too_short,
            datagrams_unmatched: stats.datagrams_unmatched,
            recv_failures: stats.recv_failures,
            flushes: stats.flushes,
            blobs_sent: stats.blobs_sent,
            send_failures: stats.send_failures,
            bytes_received: stats.bytes_received,
            bytes_sent: stats.bytes_sent,
        },
    }
}

/// Build the layout inspection report for a validated configuration.
///
/// # Examples
/// ```
/// use oscbatch_core::{RelayConfig, build_layout_report};
///
/// let config = RelayConfig::from_json_str(
///     r#"{
///         "listen": "127.0.0.1:9000",
///         "destination": "127.0.0.1:57120",
///         "in_address": "/accel",
///         "floats_per_msg": 3,
///         "msgs_per_blob": 4
///     }"#,
/// )?;
/// let layout = config.validate()?;
/// let report = build_layout_report(&config, &layout);
/// assert_eq!(report.out_packet_len, 64);
/// # Ok::<(), oscbatch_core::ConfigError>(())
/// ```
pub fn build_layout_report(config: &RelayConfig, layout: &PacketLayout) -> LayoutReport {
    LayoutReport {
        report_version: REPORT_VERSION,
        tool: tool_info(),
        in_address: config.in_address.clone(),
        in_type_tags: config.shape().in_type_tags(),
        in_args_offset: layout.in_args_offset,
        in_args_len: layout.in_args_len,
        in_min_datagram: layout.in_min_datagram,
        out_address: config.out_address().to_string(),
        blob_size_offset: layout.blob_size_offset,
        blob_data_offset: layout.blob_data_offset,
        blob_len: layout.blob_len,
        out_packet_len: layout.out_packet_len,
        max_packet_bytes: config.max_packet_bytes,
    }
}
