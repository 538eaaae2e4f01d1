//! Relay configuration, resolved and validated once before any network
//! activity. The values are read-only for the lifetime of the process.

use std::net::{AddrParseError, SocketAddr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocols::osc::{MessageShape, OscError, PacketLayout};

/// MTU guard for the total outbound OSC packet.
pub const DEFAULT_MAX_PACKET_BYTES: usize = 1400;
/// Receive buffer size; oversized inbound datagrams are truncated to it.
pub const DEFAULT_RECV_BUFFER_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid listen address '{addr}': {source}")]
    InvalidListen { addr: String, source: AddrParseError },
    #[error("invalid destination address '{addr}': {source}")]
    InvalidDestination { addr: String, source: AddrParseError },
    #[error("invalid OSC address '{addr}': {reason}")]
    InvalidOscAddress { addr: String, reason: &'static str },
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
    #[error("receive buffer of {actual} bytes cannot hold a minimum datagram of {needed} bytes")]
    RecvBufferTooSmall { needed: usize, actual: usize },
    #[error(transparent)]
    Layout(#[from] OscError),
}

/// Relay configuration surface.
///
/// `out_address` defaults to `in_address` when omitted (pass-through), and
/// `strict` defaults to off: the decoder trusts fixed offsets unless the
/// sender is untrusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Listen address and port, e.g. `127.0.0.1:9000`.
    pub listen: String,
    /// Send destination address and port, e.g. `127.0.0.1:57120`.
    pub destination: String,
    /// Inbound OSC address pattern, e.g. `/accel`.
    pub in_address: String,
    /// Outbound OSC address pattern; `in_address` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_address: Option<String>,
    /// Floats carried by each inbound message.
    pub floats_per_msg: usize,
    /// Inbound messages accumulated per outbound blob.
    pub msgs_per_blob: usize,
    #[serde(default = "default_max_packet_bytes")]
    pub max_packet_bytes: usize,
    /// Verify address and type-tag bytes on every datagram.
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_recv_buffer_bytes")]
    pub recv_buffer_bytes: usize,
}

fn default_max_packet_bytes() -> usize {
    DEFAULT_MAX_PACKET_BYTES
}

fn default_recv_buffer_bytes() -> usize {
    DEFAULT_RECV_BUFFER_BYTES
}

impl RelayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|source| ConfigError::InvalidListen {
            addr: self.listen.clone(),
            source,
        })
    }

    pub fn destination_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.destination
            .parse()
            .map_err(|source| ConfigError::InvalidDestination {
                addr: self.destination.clone(),
                source,
            })
    }

    /// Outbound OSC address after applying the pass-through default.
    pub fn out_address(&self) -> &str {
        self.out_address.as_deref().unwrap_or(&self.in_address)
    }

    pub fn shape(&self) -> MessageShape {
        MessageShape {
            in_address: self.in_address.clone(),
            out_address: self.out_address().to_string(),
            floats_per_msg: self.floats_per_msg,
            msgs_per_blob: self.msgs_per_blob,
            max_packet_bytes: self.max_packet_bytes,
        }
    }

    /// Validate the whole configuration and return the derived layout.
    ///
    /// Every failure here belongs to the fatal startup tier: the process
    /// must not proceed to network I/O with an invalid configuration.
    pub fn validate(&self) -> Result<PacketLayout, ConfigError> {
        self.listen_addr()?;
        self.destination_addr()?;
        check_osc_address(&self.in_address)?;
        check_osc_address(self.out_address())?;
        if self.floats_per_msg == 0 {
            return Err(ConfigError::ZeroCount {
                field: "floats_per_msg",
            });
        }
        if self.msgs_per_blob == 0 {
            return Err(ConfigError::ZeroCount {
                field: "msgs_per_blob",
            });
        }

        let layout = PacketLayout::from_shape(&self.shape())?;
        if self.recv_buffer_bytes < layout.in_min_datagram {
            return Err(ConfigError::RecvBufferTooSmall {
                needed: layout.in_min_datagram,
                actual: self.recv_buffer_bytes,
            });
        }
        Ok(layout)
    }
}

fn check_osc_address(address: &str) -> Result<(), ConfigError> {
    let reason = if address.is_empty() {
        Some("must not be empty")
    } else if !address.starts_with('/') {
        Some("must start with '/'")
    } else if address.contains('\0') {
        Some("must not contain NUL bytes")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ConfigError::InvalidOscAddress {
            addr: address.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
