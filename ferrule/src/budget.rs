use std::time::Duration;

/// Default upper bound on a single wait.
///
/// This bounds how late a scheduled job can run and how often the
/// scheduler is re-checked when nothing else happens.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(100);

/// How long a poll may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBudget {
    /// Block for at most this long.
    Bounded(Duration),

    /// Block until an endpoint becomes ready, with no upper bound.
    Unbounded,
}

impl WaitBudget {
    /// Combines the scheduler's next-due estimate with the wait ceiling.
    ///
    /// With no pending job the budget is the ceiling itself, so the
    /// result is never [`WaitBudget::Unbounded`].
    pub fn from_next_due(next_due: Option<Duration>, ceiling: Duration) -> Self {
        match next_due {
            Some(due) => WaitBudget::Bounded(due.min(ceiling)),
            None => WaitBudget::Bounded(ceiling),
        }
    }

    /// Converts the budget into a millisecond timeout for the OS primitive.
    ///
    /// Partial milliseconds round up so a short budget never degrades into
    /// a busy poll. `-1` means "no timeout".
    pub(crate) fn as_timeout_ms(&self) -> i32 {
        match self {
            WaitBudget::Bounded(d) => {
                let ms = d.as_millis() + u128::from(d.subsec_nanos() % 1_000_000 != 0);
                ms.min(i32::MAX as u128) as i32
            }
            WaitBudget::Unbounded => -1,
        }
    }
}
