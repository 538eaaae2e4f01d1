mod udp;

pub use udp::UdpTransport;

use std::net::SocketAddr;

use thiserror::Error;

/// Datagram I/O collaborator for the relay loop.
///
/// `recv` returning `Ok(None)` means "no datagram this iteration" (timeout
/// or transient condition); the loop retries. `send` transmits one payload
/// to the fixed destination.
pub trait DatagramTransport {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError>;
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}
