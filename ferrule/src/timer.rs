//! A minimal deadline queue.
//!
//! [`TimerQueue`] is the smallest [`Scheduler`] the loop can be driven
//! with: one-shot and periodic jobs ordered by deadline. It is meant for
//! clients whose engine does not bring its own scheduler.

use crate::engine::Scheduler;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};

use tracing::trace;

/// Deadline used when a delay does not fit in an [`Instant`].
///
/// About thirty years, far enough to never fire in practice.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Returns `from + delay`, saturating to [`FAR_FUTURE`] on overflow.
fn deadline_after(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay)
        .or_else(|| from.checked_add(FAR_FUTURE))
        .unwrap_or(from)
}

/// Work attached to a timer entry.
enum Job {
    /// Runs once, then the entry is gone.
    Once(Box<dyn FnOnce()>),

    /// Runs every `period` until cancelled.
    Every {
        period: Duration,
        task: Box<dyn FnMut()>,
    },
}

/// An entry in the timer queue.
struct TimerEntry {
    /// The time at which the job should run.
    deadline: Instant,

    /// Insertion sequence, so equal deadlines run in FIFO order.
    seq: u64,

    job: Job,

    /// Cancellation flag shared with the [`JobHandle`].
    cancelled: Arc<AtomicBool>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders entries by deadline, then by insertion.
    ///
    /// The comparison is **reversed** so that a `BinaryHeap<TimerEntry>`
    /// pops the earliest entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TimerEntry {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Acquire)
    }
}

/// Handle to a scheduled job.
///
/// Dropping the handle does not cancel the job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    cancelled: Arc<AtomicBool>,
}

impl JobHandle {
    /// Cancels the job. A cancelled job never runs again.
    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Acquire)
    }
}

/// Deadline-ordered job queue.
#[derive(Default)]
pub struct TimerQueue {
    /// Min-heap of pending entries.
    timers: BinaryHeap<TimerEntry>,

    /// Next insertion sequence number.
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `job` to run once after `delay`.
    ///
    /// A delay too large to represent is treated as "practically never".
    pub fn schedule<F>(&mut self, delay: Duration, job: F) -> JobHandle
    where
        F: FnOnce() + 'static,
    {
        self.push(deadline_after(Instant::now(), delay), Job::Once(Box::new(job)))
    }

    /// Schedules `job` to run every `period`, starting one period from now.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn schedule_every<F>(&mut self, period: Duration, job: F) -> JobHandle
    where
        F: FnMut() + 'static,
    {
        assert!(!period.is_zero(), "period must be > 0");

        self.push(
            deadline_after(Instant::now(), period),
            Job::Every {
                period,
                task: Box::new(job),
            },
        )
    }

    /// Number of live (not cancelled) jobs.
    pub fn len(&self) -> usize {
        self.timers.iter().filter(|e| !e.is_cancelled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time from `now` until the earliest live deadline, capped at `ceiling`.
    ///
    /// Cancelled entries at the front of the queue are discarded.
    pub fn next_due_at(&mut self, now: Instant, ceiling: Duration) -> Option<Duration> {
        self.discard_cancelled();

        self.timers
            .peek()
            .map(|entry| entry.deadline.saturating_duration_since(now).min(ceiling))
    }

    /// Runs every job whose deadline is not after `now`.
    ///
    /// Periodic jobs are re-armed one period after their previous
    /// deadline, or one period after `now` if they fell behind. A job
    /// re-armed during this call does not run again before the next call.
    pub fn run_due_at(&mut self, now: Instant) -> usize {
        let mut due = Vec::new();

        while let Some(entry) = self.timers.peek() {
            if entry.deadline > now {
                break;
            }

            if let Some(entry) = self.timers.pop() {
                if !entry.is_cancelled() {
                    due.push(entry);
                }
            }
        }

        let ran = due.len();

        for entry in due {
            match entry.job {
                Job::Once(job) => job(),
                Job::Every { period, mut task } => {
                    task();

                    if entry.cancelled.load(AtomicOrdering::Acquire) {
                        continue;
                    }

                    let mut deadline = deadline_after(entry.deadline, period);
                    if deadline <= now {
                        deadline = deadline_after(now, period);
                    }

                    let seq = self.bump_seq();
                    self.timers.push(TimerEntry {
                        deadline,
                        seq,
                        job: Job::Every { period, task },
                        cancelled: entry.cancelled,
                    });
                }
            }
        }

        if ran > 0 {
            trace!(ran, pending = self.timers.len(), "ran due jobs");
        }

        ran
    }

    fn push(&mut self, deadline: Instant, job: Job) -> JobHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let seq = self.bump_seq();

        self.timers.push(TimerEntry {
            deadline,
            seq,
            job,
            cancelled: cancelled.clone(),
        });

        JobHandle { cancelled }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn discard_cancelled(&mut self) {
        while self.timers.peek().is_some_and(TimerEntry::is_cancelled) {
            self.timers.pop();
        }
    }
}

impl Scheduler for TimerQueue {
    fn next_due(&mut self, ceiling: Duration) -> Option<Duration> {
        self.next_due_at(Instant::now(), ceiling)
    }

    fn run_due(&mut self) -> usize {
        self.run_due_at(Instant::now())
    }
}
