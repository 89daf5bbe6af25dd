//! Error types for the event loop.
//!
//! Errors are split by blast radius:
//! - [`ServeError`] stays local to one endpoint and never ends an iteration,
//! - [`PollError`] affects the whole poll and is returned to the caller
//!   wrapped in a [`LoopError`].

use crate::poller::platform::RawFd;

use std::io;

/// Failure reported by the protocol engine while serving one endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The socket failed while reading pending data.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The peer sent data the engine could not make sense of.
    #[error("malformed message: {message}")]
    Malformed {
        /// Details about what was wrong with the message.
        message: String,
    },

    /// Engine-specific failure carrying the engine's own error code.
    #[error("engine error {code}: {message}")]
    Engine {
        /// Raw error code as reported by the engine.
        code: i32,
        /// Human-readable description.
        message: String,
    },
}

/// Failure of the readiness primitive itself.
///
/// Any of these invalidates the whole poll, so the iteration ends.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The OS reported a hard error (anything but an interrupted call).
    #[error("readiness poll failed: {0}")]
    Os(#[from] io::Error),

    /// A descriptor in the snapshot is closed or otherwise unusable.
    #[error("invalid descriptor {fd} at position {position}")]
    InvalidDescriptor {
        /// Position of the endpoint in the snapshot.
        position: usize,
        /// The offending descriptor.
        fd: RawFd,
    },

    /// The snapshot does not fit the primitive's descriptor count.
    #[error("too many endpoints to poll: {count}")]
    TooManyEndpoints {
        /// Number of endpoints in the snapshot.
        count: usize,
    },

    /// An unbounded wait was requested with nothing to wait on.
    #[error("unbounded wait requested with no endpoints")]
    NothingToWaitOn,
}

/// Fatal outcome of a loop iteration.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// The readiness poll failed; no endpoint was dispatched.
    #[error(transparent)]
    Poll(#[from] PollError),
}
