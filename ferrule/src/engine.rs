//! Interfaces the loop consumes from its collaborators.
//!
//! The loop owns none of the protocol logic. It only talks to:
//! - an [`Engine`], which lists its sockets and serves the ready ones,
//! - a [`Scheduler`], which tells how long the loop may sleep.

use crate::endpoint::EndpointSet;
use crate::error::ServeError;

use std::time::Duration;

/// A protocol engine driven by the loop.
pub trait Engine {
    /// Opaque reference back to the transport object behind an endpoint.
    type Handle;

    /// Returns a snapshot of the currently active endpoints.
    ///
    /// The snapshot is only valid until the next call.
    fn active_endpoints(&mut self) -> EndpointSet<Self::Handle>;

    /// Processes the pending data of one ready endpoint.
    fn serve(&mut self, handle: &Self::Handle) -> Result<(), ServeError>;
}

/// The engine's job scheduler, seen from the loop.
pub trait Scheduler {
    /// Returns the time until the next pending job, capped at `ceiling`.
    ///
    /// `None` means no job is pending.
    fn next_due(&mut self, ceiling: Duration) -> Option<Duration>;

    /// Runs every job that is due and returns how many ran.
    fn run_due(&mut self) -> usize;
}

/// A scheduler that never has anything to do.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl Scheduler for Idle {
    fn next_due(&mut self, _ceiling: Duration) -> Option<Duration> {
        None
    }

    fn run_due(&mut self) -> usize {
        0
    }
}
