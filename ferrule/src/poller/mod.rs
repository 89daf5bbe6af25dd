//! Readiness multiplexing over a snapshot of endpoints.
//!
//! This module wraps the platform readiness primitive behind a single
//! [`Poller`]. The poller:
//! - turns an endpoint snapshot into a read-interest request,
//! - blocks for at most the given [`WaitBudget`],
//! - reports readiness per endpoint, in snapshot order.
//!
//! The concrete backend is selected at compile time depending on the
//! target operating system.

pub(crate) mod common;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(windows)]
pub(crate) use windows as platform;

pub use common::{PollOutcome, PollRecord};

use crate::budget::WaitBudget;
use crate::endpoint::EndpointSet;
use crate::error::PollError;
use crate::host::{SuspendHooks, Suspended};
use common::Readiness;

use std::io;
use std::thread;

use tracing::debug;

/// Read-readiness poller.
///
/// The poller keeps a scratch buffer of OS entries between calls. The
/// buffer is cleared and resized to the snapshot on every poll; no
/// descriptor survives from one poll to the next.
pub struct Poller {
    /// Reusable buffer handed to the OS primitive.
    fds: Vec<platform::PollFd>,
}

impl Poller {
    /// Creates a new poller with an empty request buffer.
    pub fn new() -> Self {
        Self { fds: Vec::new() }
    }

    /// Waits until an endpoint is readable or the budget elapses.
    ///
    /// The blocking part of the call, and only that part, runs between
    /// `hooks.on_suspend()` and `hooks.on_resume()`.
    ///
    /// With no endpoints the OS primitive is not called at all: the thread
    /// sleeps for the budget instead.
    ///
    /// # Errors
    ///
    /// - [`PollError::TooManyEndpoints`] if the snapshot does not fit the primitive,
    /// - [`PollError::InvalidDescriptor`] if a descriptor is negative or not open,
    /// - [`PollError::NothingToWaitOn`] for an unbounded wait on no endpoints,
    /// - [`PollError::Os`] for any other failure of the primitive.
    ///
    /// An interrupted call is not an error; it reports zero ready endpoints.
    pub fn poll<H, S>(
        &mut self,
        endpoints: EndpointSet<H>,
        budget: WaitBudget,
        hooks: &mut S,
    ) -> Result<PollOutcome<H>, PollError>
    where
        S: SuspendHooks + ?Sized,
    {
        let mut records: Vec<PollRecord<H>> =
            endpoints.into_iter().map(PollRecord::new).collect();

        if records.is_empty() {
            let WaitBudget::Bounded(wait) = budget else {
                return Err(PollError::NothingToWaitOn);
            };

            let _suspended = Suspended::new(hooks);
            thread::sleep(wait);

            return Ok(PollOutcome { ready: 0, records });
        }

        if records.len() > platform::max_descriptors() {
            return Err(PollError::TooManyEndpoints {
                count: records.len(),
            });
        }

        self.fds.clear();
        self.fds.reserve(records.len());

        for (position, record) in records.iter().enumerate() {
            let fd = record.endpoint.fd;
            if !platform::is_valid(fd) {
                return Err(PollError::InvalidDescriptor { position, fd });
            }
            self.fds.push(platform::read_interest(fd));
        }

        let result = {
            let _suspended = Suspended::new(hooks);
            platform::sys_poll(&mut self.fds, budget.as_timeout_ms())
        };

        let count = match result {
            Ok(count) => count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                debug!("poll interrupted, reporting no readiness");
                0
            }
            Err(err) => return Err(PollError::Os(err)),
        };

        let mut ready = 0;

        if count > 0 {
            for (position, (record, fd)) in records.iter_mut().zip(&self.fds).enumerate() {
                match platform::readiness(fd) {
                    Readiness::Idle => {}
                    Readiness::Ready => {
                        record.ready = true;
                        ready += 1;
                    }
                    Readiness::Invalid => {
                        return Err(PollError::InvalidDescriptor {
                            position,
                            fd: record.endpoint.fd,
                        });
                    }
                }
            }
        }

        Ok(PollOutcome { ready, records })
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}
