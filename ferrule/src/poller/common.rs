use crate::endpoint::Endpoint;
use crate::poller::platform::RawFd;

/// What the OS reported for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// Nothing happened on the descriptor.
    Idle,

    /// The descriptor has something to read (data, error or hang-up).
    Ready,

    /// The descriptor is not open.
    Invalid,
}

/// One entry of a poll request.
///
/// The record keeps the descriptor, the engine handle and the observed
/// readiness together, so the dispatcher never has to line up parallel
/// arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord<H> {
    pub(crate) endpoint: Endpoint<H>,
    pub(crate) ready: bool,
}

impl<H> PollRecord<H> {
    /// Creates a record with read interest and no observed readiness.
    pub(crate) fn new(endpoint: Endpoint<H>) -> Self {
        Self {
            endpoint,
            ready: false,
        }
    }

    /// Returns the polled descriptor.
    pub fn fd(&self) -> RawFd {
        self.endpoint.fd
    }

    /// Returns the engine handle of the endpoint.
    pub fn handle(&self) -> &H {
        &self.endpoint.handle
    }

    /// Returns `true` if the OS reported the endpoint as readable.
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Result of a successful poll.
///
/// `records` has exactly one entry per polled endpoint, in the order the
/// endpoints were given.
#[derive(Debug)]
pub struct PollOutcome<H> {
    pub(crate) ready: usize,
    pub(crate) records: Vec<PollRecord<H>>,
}

impl<H> PollOutcome<H> {
    /// Number of endpoints reported ready. Zero means the budget elapsed.
    pub fn ready(&self) -> usize {
        self.ready
    }

    /// One record per polled endpoint, in snapshot order.
    pub fn records(&self) -> &[PollRecord<H>] {
        &self.records
    }

    /// Ready flags in endpoint order.
    pub fn ready_flags(&self) -> Vec<bool> {
        self.records.iter().map(PollRecord::is_ready).collect()
    }

    /// Consumes the outcome and returns its records, in snapshot order.
    pub fn into_records(self) -> Vec<PollRecord<H>> {
        self.records
    }
}
