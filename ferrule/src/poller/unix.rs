//! Unix `poll(2)` backend.
//!
//! `poll` is used rather than `epoll`/`kqueue` because the descriptor set
//! is rebuilt on every iteration: there is no registration to keep in sync
//! with the engine, and one syscall covers the whole snapshot.

use super::common::Readiness;

use libc::{POLLIN, POLLNVAL, nfds_t, poll, pollfd};
use std::io;

/// Raw descriptor type on Unix.
pub type RawFd = std::os::fd::RawFd;

/// Entry type expected by `poll(2)`.
pub(crate) type PollFd = pollfd;

/// Largest descriptor count `poll(2)` can be asked to watch.
pub(crate) fn max_descriptors() -> usize {
    usize::try_from(nfds_t::MAX).unwrap_or(usize::MAX)
}

/// Returns `false` for descriptors `poll(2)` would silently skip.
pub(crate) fn is_valid(fd: RawFd) -> bool {
    fd >= 0
}

/// Builds a read-interest entry.
pub(crate) fn read_interest(fd: RawFd) -> PollFd {
    pollfd {
        fd,
        events: POLLIN,
        revents: 0,
    }
}

/// Interprets the events returned for one entry.
pub(crate) fn readiness(fd: &PollFd) -> Readiness {
    if fd.revents & POLLNVAL != 0 {
        Readiness::Invalid
    } else if fd.revents != 0 {
        Readiness::Ready
    } else {
        Readiness::Idle
    }
}

/// Waits for readiness on every entry.
///
/// Returns the number of entries with non-zero `revents`.
/// The caller must have checked `fds.len()` against [`max_descriptors`].
pub(crate) fn sys_poll(fds: &mut [PollFd], timeout_ms: i32) -> io::Result<usize> {
    let rc = unsafe { poll(fds.as_mut_ptr(), fds.len() as nfds_t, timeout_ms) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}
