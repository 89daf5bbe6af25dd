//! Networking collaborators for the loop.
//!
//! - [`udp`]: a UDP [`Engine`](crate::engine::Engine) feeding datagrams to a handler
//! - [`uri`]: `coap://` server URI parsing and resolution

pub mod udp;
pub mod uri;

pub use udp::{DEFAULT_DRAIN_LIMIT, Datagram, UdpTransport};
pub use uri::{ServerUri, UriError};
