//! Repeated driving of a [`LoopDriver`] until told to stop.
//!
//! The driver only knows how to run one iteration. [`Runner`] adds what a
//! client process needs around it:
//! - repeat iterations until a [`StopSignal`] fires,
//! - run the scheduler's due jobs after each iteration,
//! - log dispatch failures,
//! - decide what a fatal poll error means for the run.

use crate::driver::LoopDriver;
use crate::engine::{Engine, Scheduler};
use crate::error::LoopError;
use crate::host::SuspendHooks;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, warn};

/// Cooperative stop request shared between threads.
///
/// Cloning the signal shares the underlying flag. The flag is checked
/// between iterations only; an in-flight poll runs to its budget.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests every runner sharing this signal to stop.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns the raw flag, e.g. to register it with a signal handler.
    pub fn flag(&self) -> Arc<AtomicBool> {
        self.flag.clone()
    }
}

/// Counters accumulated over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Iterations attempted, failed ones included.
    pub iterations: u64,

    /// Ready endpoints dispatched.
    pub ready: u64,

    /// Serve calls that failed.
    pub failures: u64,

    /// Scheduler jobs run.
    pub jobs: u64,

    /// Fatal poll errors that were tolerated.
    pub recovered: u64,
}

/// Drives a loop until stopped.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    /// Fatal poll errors tolerated in a row before giving up.
    max_consecutive_fatal: u32,
}

impl Runner {
    /// Creates a runner that stops at the first fatal poll error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerates up to `n` fatal poll errors in a row.
    ///
    /// Each tolerated error is logged and the next iteration starts over
    /// with a fresh snapshot. A successful iteration resets the count.
    pub fn max_consecutive_fatal(mut self, n: u32) -> Self {
        self.max_consecutive_fatal = n;
        self
    }

    /// Runs iterations until `stop` is triggered.
    ///
    /// The stop signal is checked before every iteration, so a signal
    /// triggered beforehand runs nothing.
    ///
    /// # Errors
    ///
    /// Returns the poll error that exceeded the tolerated streak.
    pub fn run<E, S, K>(
        &self,
        driver: &mut LoopDriver<E, S, K>,
        stop: &StopSignal,
    ) -> Result<RunStats, LoopError>
    where
        E: Engine,
        S: Scheduler,
        K: SuspendHooks,
    {
        let mut stats = RunStats::default();
        let mut consecutive = 0;

        while !stop.is_triggered() {
            stats.iterations += 1;

            match driver.run_iteration() {
                Ok(report) => {
                    consecutive = 0;
                    stats.ready += report.ready as u64;
                    stats.failures += report.failures.len() as u64;

                    for failure in &report.failures {
                        error!(
                            position = failure.position,
                            fd = failure.endpoint.fd(),
                            error = %failure.error,
                            "serve failed"
                        );
                    }
                }
                Err(err) => {
                    consecutive += 1;

                    if consecutive > self.max_consecutive_fatal {
                        error!(error = %err, "loop iteration failed");
                        return Err(err);
                    }

                    warn!(error = %err, consecutive, "loop iteration failed, retrying");
                    stats.recovered += 1;
                }
            }

            stats.jobs += driver.run_due_jobs() as u64;
        }

        Ok(stats)
    }
}
