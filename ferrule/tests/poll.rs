use ferrule::{Endpoint, NoHooks, PollError, Poller, SuspendHooks, WaitBudget};
use proptest::prelude::*;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

fn bound_socket() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").expect("Failed to bind socket")
}

fn endpoints(sockets: &[UdpSocket]) -> Vec<Endpoint<usize>> {
    sockets
        .iter()
        .enumerate()
        .map(|(index, socket)| Endpoint::from_socket(socket, index))
        .collect()
}

fn send_to(sender: &UdpSocket, target: &UdpSocket) {
    let addr = target.local_addr().expect("Failed to get local address");
    sender.send_to(b"ping", addr).expect("Failed to send datagram");
}

#[derive(Default)]
struct Counting {
    suspended: usize,
    resumed: usize,
}

impl SuspendHooks for Counting {
    fn on_suspend(&mut self) {
        self.suspended += 1;
    }

    fn on_resume(&mut self) {
        self.resumed += 1;
    }
}

#[test]
fn test_poll_reports_ready_endpoints_in_order() {
    let sockets: Vec<_> = (0..3).map(|_| bound_socket()).collect();
    let sender = bound_socket();
    send_to(&sender, &sockets[1]);

    let mut poller = Poller::new();
    let outcome = poller
        .poll(
            endpoints(&sockets),
            WaitBudget::Bounded(Duration::from_secs(5)),
            &mut NoHooks,
        )
        .expect("Poll failed");

    assert_eq!(outcome.ready(), 1);
    assert_eq!(outcome.ready_flags(), vec![false, true, false]);

    let handles: Vec<usize> = outcome.records().iter().map(|r| *r.handle()).collect();
    assert_eq!(handles, vec![0, 1, 2]);

    for (record, endpoint) in outcome.records().iter().zip(endpoints(&sockets)) {
        assert_eq!(record.fd(), endpoint.fd());
    }
}

#[test]
fn test_zero_budget_returns_immediately() {
    let sockets: Vec<_> = (0..2).map(|_| bound_socket()).collect();

    let start = Instant::now();
    let outcome = Poller::new()
        .poll(endpoints(&sockets), WaitBudget::Bounded(Duration::ZERO), &mut NoHooks)
        .expect("Poll failed");

    assert_eq!(outcome.ready(), 0);
    assert_eq!(outcome.ready_flags(), vec![false, false]);
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "Zero budget poll should not block"
    );
}

#[test]
fn test_timeout_without_traffic() {
    let sockets = vec![bound_socket()];

    let start = Instant::now();
    let outcome = Poller::new()
        .poll(
            endpoints(&sockets),
            WaitBudget::Bounded(Duration::from_millis(30)),
            &mut NoHooks,
        )
        .expect("Poll failed");

    assert_eq!(outcome.ready(), 0);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_no_endpoints_waits_for_budget() {
    let mut hooks = Counting::default();

    let start = Instant::now();
    let outcome = Poller::new()
        .poll(
            Vec::<Endpoint<usize>>::new(),
            WaitBudget::Bounded(Duration::from_millis(30)),
            &mut hooks,
        )
        .expect("Poll failed");

    assert_eq!(outcome.ready(), 0);
    assert!(outcome.records().is_empty());
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert_eq!(hooks.suspended, 1);
    assert_eq!(hooks.resumed, 1);
}

#[test]
fn test_no_endpoints_unbounded_is_rejected() {
    let mut hooks = Counting::default();

    let result = Poller::new().poll(
        Vec::<Endpoint<usize>>::new(),
        WaitBudget::Unbounded,
        &mut hooks,
    );

    assert!(matches!(result, Err(PollError::NothingToWaitOn)));
    assert_eq!(hooks.suspended, 0);
}

#[test]
fn test_unbounded_returns_on_readiness() {
    let sockets: Vec<_> = (0..2).map(|_| bound_socket()).collect();
    let sender = bound_socket();
    send_to(&sender, &sockets[0]);

    let outcome = Poller::new()
        .poll(endpoints(&sockets), WaitBudget::Unbounded, &mut NoHooks)
        .expect("Poll failed");

    assert_eq!(outcome.ready(), 1);
    assert_eq!(outcome.ready_flags(), vec![true, false]);
}

#[test]
fn test_hooks_bracket_blocking_call() {
    let sockets = vec![bound_socket()];
    let mut hooks = Counting::default();

    Poller::new()
        .poll(
            endpoints(&sockets),
            WaitBudget::Bounded(Duration::from_millis(5)),
            &mut hooks,
        )
        .expect("Poll failed");

    assert_eq!(hooks.suspended, 1);
    assert_eq!(hooks.resumed, 1);
}

#[cfg(unix)]
#[test]
fn test_negative_descriptor_is_rejected_before_polling() {
    let mut hooks = Counting::default();
    let endpoints = vec![Endpoint::new(-1, 0usize)];

    let result = Poller::new().poll(
        endpoints,
        WaitBudget::Bounded(Duration::from_millis(5)),
        &mut hooks,
    );

    assert!(matches!(
        result,
        Err(PollError::InvalidDescriptor { position: 0, fd: -1 })
    ));
    assert_eq!(hooks.suspended, 0);
}

#[cfg(unix)]
#[test]
fn test_closed_descriptor_is_fatal() {
    // Far above any descriptor the test process opens.
    const NOT_OPEN: i32 = 1 << 30;

    let socket = bound_socket();
    let mut hooks = Counting::default();
    let endpoints = vec![
        Endpoint::from_socket(&socket, 0usize),
        Endpoint::new(NOT_OPEN, 1),
    ];

    let result = Poller::new().poll(
        endpoints,
        WaitBudget::Bounded(Duration::from_millis(5)),
        &mut hooks,
    );

    assert!(matches!(
        result,
        Err(PollError::InvalidDescriptor {
            position: 1,
            fd: NOT_OPEN
        })
    ));
    assert_eq!(hooks.suspended, 1);
    assert_eq!(hooks.resumed, 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_interrupted_poll_reports_nothing_ready() {
    use signal_hook::consts::SIGUSR1;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    // poll(2) is never restarted after a handler runs, so the call fails with EINTR.
    unsafe { signal_hook::low_level::register(SIGUSR1, || {}) }
        .expect("Failed to register signal handler");

    let sockets = vec![bound_socket()];
    let polling_thread = unsafe { libc::pthread_self() };
    let done = Arc::new(AtomicBool::new(false));

    let interrupter_done = done.clone();
    let interrupter = thread::spawn(move || {
        while !interrupter_done.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(50));
            unsafe { libc::pthread_kill(polling_thread, SIGUSR1) };
        }
    });

    let start = Instant::now();
    let result = Poller::new().poll(
        endpoints(&sockets),
        WaitBudget::Bounded(Duration::from_secs(2)),
        &mut NoHooks,
    );
    let elapsed = start.elapsed();

    done.store(true, Ordering::Release);
    interrupter.join().expect("Interrupter thread panicked");

    let outcome = result.expect("Interrupted poll should not fail");
    assert_eq!(outcome.ready(), 0);
    assert_eq!(outcome.ready_flags(), vec![false]);
    assert!(
        elapsed < Duration::from_secs(1),
        "Interrupted poll should return before its budget"
    );
}

#[test]
fn test_poller_is_reusable() {
    let sockets: Vec<_> = (0..4).map(|_| bound_socket()).collect();
    let sender = bound_socket();
    let mut poller = Poller::new();

    let outcome = poller
        .poll(endpoints(&sockets), WaitBudget::Bounded(Duration::ZERO), &mut NoHooks)
        .expect("Poll failed");
    assert_eq!(outcome.records().len(), 4);

    send_to(&sender, &sockets[0]);
    let outcome = poller
        .poll(endpoints(&sockets[..1]), WaitBudget::Bounded(Duration::ZERO), &mut NoHooks)
        .expect("Poll failed");
    assert_eq!(outcome.ready_flags(), vec![true]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_records_align_with_endpoints(ready in proptest::collection::vec(any::<bool>(), 0..8)) {
        let sockets: Vec<_> = ready.iter().map(|_| bound_socket()).collect();
        let sender = bound_socket();

        for (socket, &is_ready) in sockets.iter().zip(&ready) {
            if is_ready {
                send_to(&sender, socket);
            }
        }

        let outcome = Poller::new()
            .poll(endpoints(&sockets), WaitBudget::Bounded(Duration::ZERO), &mut NoHooks)
            .expect("Poll failed");

        prop_assert_eq!(outcome.records().len(), sockets.len());
        prop_assert_eq!(outcome.ready_flags(), ready.clone());
        prop_assert_eq!(outcome.ready(), ready.iter().filter(|r| **r).count());

        for (position, record) in outcome.records().iter().enumerate() {
            prop_assert_eq!(*record.handle(), position);
        }
    }
}
