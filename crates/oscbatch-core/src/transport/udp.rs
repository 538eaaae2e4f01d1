//! UDP transport implementation.
//!
//! One socket handles both directions, bound to the listen address and
//! sending to a fixed destination. A read timeout keeps the relay loop's
//! stop flag observable on an idle socket; datagrams larger than the
//! caller's buffer are truncated to it.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use super::{DatagramTransport, TransportError};

pub struct UdpTransport {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpTransport {
    pub fn bind(
        listen: SocketAddr,
        destination: SocketAddr,
        read_timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(listen).map_err(|source| TransportError::Bind {
            addr: listen,
            source,
        })?;
        socket.set_read_timeout(read_timeout)?;
        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }
}

impl DatagramTransport for UdpTransport {
    fn recv(&mut self, buf: &mut [u8]) -> Result<Option<usize>, TransportError> {
        match self.socket.recv_from(buf) {
            Ok((len, _)) => Ok(Some(len)),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.socket.send_to(payload, self.destination)?;
        Ok(())
    }
}
