use crate::poller::platform::RawFd;

/// A network endpoint handed to the loop by the protocol engine.
///
/// An `Endpoint` pairs:
/// - the raw descriptor the polling primitive waits on,
/// - an opaque handle pointing back to the engine's transport object.
///
/// The engine owns the underlying socket. The loop only keeps an
/// `Endpoint` for the duration of a single iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint<H> {
    /// Descriptor passed to the OS readiness primitive.
    pub(crate) fd: RawFd,

    /// Handle given back to the engine when the endpoint is served.
    pub(crate) handle: H,
}

/// An ordered snapshot of the engine's active endpoints.
///
/// The order is only meaningful within one iteration, but it must not
/// change between the poll and the dispatch that follows it.
pub type EndpointSet<H> = Vec<Endpoint<H>>;

impl<H> Endpoint<H> {
    /// Creates an endpoint from a raw descriptor and its engine handle.
    pub fn new(fd: RawFd, handle: H) -> Self {
        Self { fd, handle }
    }

    /// Creates an endpoint from any socket exposing a raw descriptor.
    #[cfg(unix)]
    pub fn from_socket<S: std::os::fd::AsRawFd>(socket: &S, handle: H) -> Self {
        Self::new(socket.as_raw_fd(), handle)
    }

    /// Creates an endpoint from any socket exposing a raw socket.
    #[cfg(windows)]
    pub fn from_socket<S: std::os::windows::io::AsRawSocket>(socket: &S, handle: H) -> Self {
        Self::new(socket.as_raw_socket(), handle)
    }

    /// Returns the raw descriptor.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Returns the engine handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }
}
