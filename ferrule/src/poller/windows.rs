//! Windows `WSAPoll` backend.
//!
//! Mirrors the Unix `poll(2)` backend. `WSAPoll` only accepts sockets,
//! which is all the loop ever waits on.

use super::common::Readiness;

use std::io;
use std::sync::OnceLock;

use windows_sys::Win32::Networking::WinSock::{
    INVALID_SOCKET, POLLNVAL, POLLRDNORM, SOCKET, SOCKET_ERROR, WSADATA, WSAPOLLFD, WSAPoll,
    WSAStartup,
};

/// Raw descriptor type on Windows.
pub type RawFd = std::os::windows::io::RawSocket;

/// Entry type expected by `WSAPoll`.
pub(crate) type PollFd = WSAPOLLFD;

/// Result code of the one-time `WSAStartup` call.
static WINSOCK_INIT: OnceLock<i32> = OnceLock::new();

/// Initializes Winsock once per process.
///
/// Sockets created through `std::net` already do this, but the poller may
/// be handed raw sockets created elsewhere. A failed startup is reported
/// on every call.
fn ensure_winsock() -> io::Result<()> {
    let rc = *WINSOCK_INIT.get_or_init(|| unsafe {
        let mut data: WSADATA = std::mem::zeroed();
        // Version 2.2
        WSAStartup(0x0202, &mut data as *mut _)
    });

    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

pub(crate) fn max_descriptors() -> usize {
    u32::MAX as usize
}

pub(crate) fn is_valid(fd: RawFd) -> bool {
    fd as SOCKET != INVALID_SOCKET
}

pub(crate) fn read_interest(fd: RawFd) -> PollFd {
    WSAPOLLFD {
        fd: fd as SOCKET,
        events: POLLRDNORM,
        revents: 0,
    }
}

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
pub(crate) fn sys_poll(fds: &mut [PollFd], timeout_ms: i32) -> io::Result<usize> {
    ensure_winsock()?;

    let rc = unsafe { WSAPoll(fds.as_mut_ptr(), fds.len() as u32, timeout_ms) };
    if rc == SOCKET_ERROR {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winsock_starts() {
        assert!(ensure_winsock().is_ok());
        assert!(ensure_winsock().is_ok());
    }

    #[test]
    fn test_invalid_socket_is_rejected() {
        assert!(!is_valid(INVALID_SOCKET as RawFd));
    }
}
