use crate::endpoint::{Endpoint, EndpointSet};
use crate::engine::Engine;
use crate::error::ServeError;

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// Size of the receive buffer, large enough for any UDP payload.
const RECV_BUFFER: usize = 64 * 1024;

/// Default number of datagrams handled by one `serve` call.
pub const DEFAULT_DRAIN_LIMIT: usize = 64;

/// A datagram received on one of the transport's sockets.
#[derive(Debug)]
pub struct Datagram<'a> {
    /// Index of the socket the datagram arrived on.
    pub socket: usize,

    /// Sender address.
    pub peer: SocketAddr,

    /// Datagram payload.
    pub payload: &'a [u8],
}

/// A UDP transport exposing its sockets to the loop.
///
/// Every socket is switched to non-blocking mode when added. Serving a
/// socket drains its pending datagrams into the handler, stopping as soon
/// as a read would block or the drain limit is reached. Datagrams left
/// over keep the socket readable, so they are picked up by the next
/// iteration after the other ready sockets had their turn.
///
/// Endpoint handles are socket indices.
pub struct UdpTransport<F> {
    /// Sockets in endpoint order.
    sockets: Vec<UdpSocket>,

    /// Called once per received datagram.
    handler: F,

    /// Reusable receive buffer.
    buffer: Vec<u8>,

    /// Datagrams handled per `serve` call.
    drain_limit: usize,
}

impl<F> UdpTransport<F>
where
    F: FnMut(Datagram<'_>) -> Result<(), ServeError>,
{
    /// Creates a transport without sockets.
    pub fn new(handler: F) -> Self {
        Self {
            sockets: Vec::new(),
            handler,
            buffer: vec![0; RECV_BUFFER],
            drain_limit: DEFAULT_DRAIN_LIMIT,
        }
    }

    /// Sets how many datagrams one `serve` call handles at most.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    pub fn drain_limit(mut self, limit: usize) -> Self {
        assert!(limit > 0, "drain_limit must be > 0");

        self.drain_limit = limit;
        self
    }

    /// Adds a socket and returns its index.
    pub fn add_socket(&mut self, socket: UdpSocket) -> io::Result<usize> {
        socket.set_nonblocking(true)?;
        self.sockets.push(socket);

        Ok(self.sockets.len() - 1)
    }

    /// Binds an ephemeral socket connected to `server` and adds it.
    ///
    /// The local address uses the same family as `server`.
    pub fn connect(&mut self, server: SocketAddr) -> io::Result<usize> {
        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(server)?;

        self.add_socket(socket)
    }

    /// Returns the socket at `index`.
    pub fn socket(&self, index: usize) -> Option<&UdpSocket> {
        self.sockets.get(index)
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

impl<F> Engine for UdpTransport<F>
where
    F: FnMut(Datagram<'_>) -> Result<(), ServeError>,
{
    type Handle = usize;

    fn active_endpoints(&mut self) -> EndpointSet<usize> {
        self.sockets
            .iter()
            .enumerate()
            .map(|(index, socket)| Endpoint::from_socket(socket, index))
            .collect()
    }

    fn serve(&mut self, handle: &usize) -> Result<(), ServeError> {
        let index = *handle;
        let socket = self.sockets.get(index).ok_or_else(|| ServeError::Engine {
            code: -1,
            message: format!("unknown socket {index}"),
        })?;

        let mut handled = 0;

        while handled < self.drain_limit {
            match socket.recv_from(&mut self.buffer) {
                Ok((len, peer)) => {
                    handled += 1;
                    (self.handler)(Datagram {
                        socket: index,
                        peer,
                        payload: &self.buffer[..len],
                    })?;
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(ServeError::Io(err)),
            }
        }

        Ok(())
    }
}
