use crate::endpoint::Endpoint;
use crate::engine::Engine;
use crate::error::ServeError;
use crate::poller::PollRecord;

/// A serve call that failed during dispatch.
///
/// Failures are local to their endpoint; the rest of the iteration
/// carries on.
#[derive(Debug)]
pub struct DispatchFailure<H> {
    /// Position of the endpoint in the iteration's snapshot.
    pub position: usize,

    /// The endpoint that failed.
    pub endpoint: Endpoint<H>,

    /// What the engine reported.
    pub error: ServeError,
}

/// Serves every ready record, in snapshot order.
///
/// Each ready endpoint is served exactly once. A failing endpoint is
/// recorded and does not prevent the following ones from being served.
/// Nothing is retried.
pub fn dispatch<E>(
    engine: &mut E,
    records: Vec<PollRecord<E::Handle>>,
) -> Vec<DispatchFailure<E::Handle>>
where
    E: Engine + ?Sized,
{
    let mut failures = Vec::new();

    for (position, record) in records.into_iter().enumerate() {
        if !record.ready {
            continue;
        }

        if let Err(error) = engine.serve(&record.endpoint.handle) {
            failures.push(DispatchFailure {
                position,
                endpoint: record.endpoint,
                error,
            });
        }
    }

    failures
}
