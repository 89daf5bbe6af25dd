//! The loop driver.
//!
//! One call to [`LoopDriver::run_iteration`] performs a full cycle:
//! 1. take a snapshot of the engine's active endpoints,
//! 2. compute the wait budget from the scheduler,
//! 3. poll the snapshot for read readiness,
//! 4. dispatch the ready endpoints to the engine.
//!
//! The driver never loops on its own. Repetition, threading and shutdown
//! belong to the caller (see [`crate::runner`]).

pub mod builder;
pub mod dispatch;

pub use dispatch::{DispatchFailure, dispatch};

use crate::budget::WaitBudget;
use crate::engine::{Engine, Scheduler};
use crate::error::LoopError;
use crate::host::SuspendHooks;
use crate::poller::Poller;

use std::time::Duration;

use tracing::trace;

/// What happened during one iteration.
#[derive(Debug)]
pub struct IterationReport<H> {
    /// Number of endpoints reported ready. Zero when the budget elapsed.
    pub ready: usize,

    /// Serve calls that failed. These never end the iteration.
    pub failures: Vec<DispatchFailure<H>>,

    /// The wait budget the poll was given.
    pub budget: WaitBudget,
}

impl<H> IterationReport<H> {
    /// Returns `true` if nothing became ready.
    pub fn is_idle(&self) -> bool {
        self.ready == 0
    }
}

/// Drives an [`Engine`] one iteration at a time.
pub struct LoopDriver<E, S, K> {
    /// The protocol engine owning the sockets.
    engine: E,

    /// The engine's job scheduler.
    scheduler: S,

    /// Hooks bracketing the blocking poll.
    hooks: K,

    /// Readiness poller, reused across iterations.
    poller: Poller,

    /// Upper bound of every wait.
    max_wait: Duration,
}

impl<E, S, K> LoopDriver<E, S, K>
where
    E: Engine,
    S: Scheduler,
    K: SuspendHooks,
{
    pub(crate) fn with_max_wait(engine: E, scheduler: S, hooks: K, max_wait: Duration) -> Self {
        Self {
            engine,
            scheduler,
            hooks,
            poller: Poller::new(),
            max_wait,
        }
    }

    /// Runs a single iteration.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Poll`] if the readiness poll fails. Nothing is
    /// dispatched in that case and the poll is not retried; the next call
    /// starts over with a fresh snapshot.
    pub fn run_iteration(&mut self) -> Result<IterationReport<E::Handle>, LoopError> {
        let endpoints = self.engine.active_endpoints();

        let next_due = self.scheduler.next_due(self.max_wait);
        let budget = WaitBudget::from_next_due(next_due, self.max_wait);

        trace!(endpoints = endpoints.len(), ?budget, "polling");

        let outcome = self.poller.poll(endpoints, budget, &mut self.hooks)?;
        let ready = outcome.ready();

        let failures = if ready > 0 {
            dispatch(&mut self.engine, outcome.into_records())
        } else {
            Vec::new()
        };

        trace!(ready, failures = failures.len(), "iteration done");

        Ok(IterationReport {
            ready,
            failures,
            budget,
        })
    }

    /// Runs the scheduler's due jobs.
    ///
    /// This is not part of an iteration; the caller decides when to run
    /// jobs, typically right after each iteration.
    pub fn run_due_jobs(&mut self) -> usize {
        self.scheduler.run_due()
    }

    /// Returns the wait ceiling.
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
