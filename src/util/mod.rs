//! Diagnostics and the crate-wide error type.

pub mod device_info;
pub mod session;
pub mod status;

use core::ffi::CStr;
use core::fmt;

use heapless::String;
use log::error;

/// Longest rendered OS error message kept by [`print_error`].
///
/// glibc's longest message is 50 characters, so this leaves room for others.
pub const MAX_ERROR_LEN: usize = 100;

/// Raw OS error code.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Errno(pub i32);

impl Errno {
    /// The calling thread's last OS error.
    pub fn last() -> Self {
        Errno(std::io::Error::last_os_error().raw_os_error().unwrap_or(0))
    }

    pub fn message(&self) -> String<MAX_ERROR_LEN> {
        describe_errno(self.0)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:[{}]", self.0, self.message())
    }
}

/// Errors returned by the utility layer.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum UtilError {
    /// Output buffer cannot hold the value and its NUL terminator.
    BufferTooSmall { needed: usize, capacity: usize },
    /// The login monitor could not be created.
    Monitor(Errno),
    /// Polling the login monitor failed.
    Poll(Errno),
    /// Device identity configuration could not be parsed.
    Config(ConfigError),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ConfigError {
    /// Not a JSON object matching the identity fields.
    Syntax,
    /// Non-whitespace bytes after the closing brace.
    TrailingCharacters,
}

impl fmt::Display for UtilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilError::BufferTooSmall { needed, capacity } => {
                write!(f, "buffer too small: need more than {} bytes, got {}", needed, capacity)
            }
            UtilError::Monitor(errno) => write!(f, "failed to allocate login monitor: {}", errno),
            UtilError::Poll(errno) => write!(f, "error polling login monitor: {}", errno),
            UtilError::Config(ConfigError::Syntax) => write!(f, "invalid device identity configuration"),
            UtilError::Config(ConfigError::TrailingCharacters) => {
                write!(f, "trailing characters after device identity configuration")
            }
        }
    }
}

impl std::error::Error for UtilError {}

/// Renders an OS error code into a bounded string.
///
/// Messages longer than `N` bytes are cut at the last whole character that fits.
pub fn describe_errno<const N: usize>(code: i32) -> String<N> {
    let mut raw = [0 as libc::c_char; 256];
    let mut out = String::new();

    // SAFETY: `raw` is a valid writable buffer of the length passed in.
    let ret = unsafe { libc::strerror_r(code, raw.as_mut_ptr(), raw.len()) };
    if ret != 0 {
        let _ = fmt::Write::write_fmt(&mut out, format_args!("Unknown error {}", code));
        return out;
    }

    // SAFETY: on success strerror_r leaves a NUL-terminated string in `raw`.
    let msg = unsafe { CStr::from_ptr(raw.as_ptr()) };
    for c in msg.to_string_lossy().chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Room for `"Error: [<code>]:[<message>]"`.
pub const ERROR_REPORT_LEN: usize = MAX_ERROR_LEN + 32;

/// The line [`print_error`] logs for `errno`.
pub fn error_report(errno: Errno) -> String<ERROR_REPORT_LEN> {
    let msg: String<MAX_ERROR_LEN> = describe_errno(errno.0);
    let mut out = String::new();
    // the code takes at most 11 digits, so the message always fits
    let _ = fmt::Write::write_fmt(&mut out, format_args!("Error: [{}]:[{}]", errno.0, msg));
    out
}

/// Logs the calling thread's last OS error. Never fails.
pub fn print_error() {
    error!("{}", error_report(Errno::last()));
}
