use super::LoopDriver;
use crate::budget::DEFAULT_MAX_WAIT;
use crate::engine::{Engine, Scheduler};
use crate::host::SuspendHooks;

use std::time::Duration;

/// Builder for configuring and creating a [`LoopDriver`].
///
/// # Examples
///
/// ```rust,ignore
/// let driver = LoopBuilder::new()
///     .max_wait(Duration::from_millis(50))
///     .build(engine, scheduler, NoHooks);
/// ```
#[derive(Debug, Clone)]
pub struct LoopBuilder {
    /// Upper bound of every wait.
    max_wait: Duration,
}

impl LoopBuilder {
    /// Creates a new `LoopBuilder` with default configuration.
    ///
    /// The wait ceiling defaults to [`DEFAULT_MAX_WAIT`] (100 ms).
    pub fn new() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Sets the wait ceiling.
    ///
    /// This bounds how late a scheduled job may run, and is also the
    /// interval at which the scheduler is re-checked when it has no job.
    ///
    /// # Panics
    ///
    /// Panics if `max_wait` is zero.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        assert!(!max_wait.is_zero(), "max_wait must be > 0");

        self.max_wait = max_wait;
        self
    }

    /// Sets the wait ceiling in milliseconds.
    ///
    /// # Panics
    ///
    /// Panics if `ms == 0`.
    pub fn max_wait_ms(self, ms: u64) -> Self {
        self.max_wait(Duration::from_millis(ms))
    }

    /// Builds the driver around its collaborators.
    pub fn build<E, S, K>(self, engine: E, scheduler: S, hooks: K) -> LoopDriver<E, S, K>
    where
        E: Engine,
        S: Scheduler,
        K: SuspendHooks,
    {
        LoopDriver::with_max_wait(engine, scheduler, hooks, self.max_wait)
    }
}

impl Default for LoopBuilder {
    /// Creates a default `LoopBuilder`.
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Idle;
    use crate::host::NoHooks;
    use crate::net::udp::UdpTransport;

    #[test]
    fn test_default_max_wait() {
        let driver = LoopBuilder::new().build(UdpTransport::new(|_| Ok(())), Idle, NoHooks);
        assert_eq!(driver.max_wait(), Duration::from_millis(100));
    }

    #[test]
    fn test_custom_max_wait() {
        let driver = LoopBuilder::new()
            .max_wait_ms(25)
            .build(UdpTransport::new(|_| Ok(())), Idle, NoHooks);
        assert_eq!(driver.max_wait(), Duration::from_millis(25));
    }

    #[test]
    #[should_panic(expected = "max_wait must be > 0")]
    fn test_zero_max_wait_panics() {
        let _ = LoopBuilder::new().max_wait(Duration::ZERO);
    }
}
