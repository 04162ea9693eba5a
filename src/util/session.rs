//! Waiting for a user session.
//!
//! systemd-logind publishes one file per logged-in user under
//! `/run/systemd/users`, replacing it atomically by rename. A [`LoginMonitor`]
//! watches such a directory with inotify and exposes a pollable descriptor.

use std::ffi::CString;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::Duration;

use embassy_time::{Timer, with_timeout};
use log::{debug, error};

use crate::util::{Errno, UtilError};

/// Time to wait for a user session, in ms.
pub const WAIT_FOR_USER_TIMEOUT: u64 = 10_000;

/// Delay between non-blocking checks in [`wait_for_user_async`].
pub const LOGIN_POLL_INTERVAL: embassy_time::Duration = embassy_time::Duration::from_millis(50);

const WATCH_MASK: u32 = libc::IN_MOVED_TO | libc::IN_DELETE;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WaitOutcome {
    /// The monitored directory changed before the timeout.
    LoggedIn,
    TimedOut,
}

fn category_dir(category: &str) -> Option<&'static str> {
    match category {
        "uid" => Some("/run/systemd/users"),
        "session" => Some("/run/systemd/sessions"),
        "seat" => Some("/run/systemd/seats"),
        "machine" => Some("/run/systemd/machines"),
        _ => None,
    }
}

/// Pollable login event source. The descriptor is closed on drop.
pub struct LoginMonitor {
    fd: OwnedFd,
}

impl LoginMonitor {
    /// Creates a monitor for a logind category: `uid`, `session`, `seat` or `machine`.
    pub fn new(category: &str) -> Result<Self, UtilError> {
        match category_dir(category) {
            Some(dir) => Self::with_path(dir),
            None => Err(UtilError::Monitor(Errno(libc::EINVAL))),
        }
    }

    /// Creates a monitor watching `dir` for entries moved in or deleted.
    pub fn with_path(dir: impl AsRef<Path>) -> Result<Self, UtilError> {
        let path = CString::new(dir.as_ref().as_os_str().as_bytes())
            .map_err(|_| UtilError::Monitor(Errno(libc::EINVAL)))?;

        // SAFETY: plain syscall, the result is checked below.
        let raw = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if raw < 0 {
            return Err(UtilError::Monitor(Errno::last()));
        }
        // SAFETY: `raw` is a freshly created descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: `path` is NUL-terminated and outlives the call.
        let wd = unsafe { libc::inotify_add_watch(fd.as_raw_fd(), path.as_ptr(), WATCH_MASK) };
        if wd < 0 {
            // `fd` is closed on return
            return Err(UtilError::Monitor(Errno::last()));
        }

        debug!("Login monitor on {:?} using fd {}", dir.as_ref(), fd.as_raw_fd());
        Ok(LoginMonitor { fd })
    }

    pub fn fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    /// Poll events to wait for on [`LoginMonitor::fd`].
    pub fn events(&self) -> libc::c_short {
        libc::POLLIN
    }

    /// Discards pending notifications.
    pub fn flush(&self) {
        let mut buf = [0u8; 4096];
        loop {
            // SAFETY: `buf` is valid for writes of its full length.
            let n = unsafe { libc::read(self.fd(), buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                break;
            }
        }
    }

    /// Waits up to `timeout_ms` for the descriptor to become readable.
    pub fn poll(&self, timeout_ms: i32) -> Result<WaitOutcome, UtilError> {
        let mut fds = libc::pollfd {
            fd: self.fd(),
            events: self.events(),
            revents: 0,
        };
        // SAFETY: `fds` is a single valid pollfd.
        let ret = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if ret < 0 {
            let errno = Errno::last();
            error!("Error polling: {}", errno);
            return Err(UtilError::Poll(errno));
        }
        Ok(if ret == 0 { WaitOutcome::TimedOut } else { WaitOutcome::LoggedIn })
    }
}

impl Drop for LoginMonitor {
    fn drop(&mut self) {
        debug!("Releasing login monitor fd {}", self.fd());
    }
}

fn timeout_ms(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX)
}

/// Blocks until a user logs in or [`WAIT_FOR_USER_TIMEOUT`] elapses.
///
/// A timeout is not an error. Neither failure is retried.
pub fn wait_for_user() -> Result<WaitOutcome, UtilError> {
    let monitor = LoginMonitor::new("uid").inspect_err(|e| error!("{}", e))?;
    monitor.poll(timeout_ms(Duration::from_millis(WAIT_FOR_USER_TIMEOUT)))
}

/// [`wait_for_user`] on an explicit directory and timeout.
pub fn wait_for_user_in(dir: impl AsRef<Path>, timeout: Duration) -> Result<WaitOutcome, UtilError> {
    let monitor = LoginMonitor::with_path(dir).inspect_err(|e| error!("{}", e))?;
    monitor.poll(timeout_ms(timeout))
}

/// Async variant for embassy executors, checking the monitor every
/// [`LOGIN_POLL_INTERVAL`] without blocking the thread.
pub async fn wait_for_user_async(
    monitor: &LoginMonitor,
    timeout: embassy_time::Duration,
) -> Result<WaitOutcome, UtilError> {
    let wait = async {
        loop {
            match monitor.poll(0) {
                Ok(WaitOutcome::LoggedIn) => return Ok(WaitOutcome::LoggedIn),
                Ok(WaitOutcome::TimedOut) => Timer::after(LOGIN_POLL_INTERVAL).await,
                Err(e) => return Err(e),
            }
        }
    };
    match with_timeout(timeout, wait).await {
        Ok(res) => res,
        Err(_) => Ok(WaitOutcome::TimedOut),
    }
}
