//! Console handle - a thin, uniform contract over an OS terminal device
//!
//! A console wraps a file descriptor known to be attached to a terminal and
//! exposes pass-through I/O, raw mode, echo control, state restoration and
//! window-size query/set. Higher layers depend only on the [`Console`] trait,
//! so tests and other platforms can supply their own implementation.
//!
//! # Example
//!
//! ```no_run
//! use console_handle::Console;
//!
//! let console = console_handle::current();
//! console.set_raw().unwrap();
//! let size = console.size().unwrap();
//! console.write(format!("{}x{}\r\n", size.width, size.height).as_bytes()).unwrap();
//! console.reset().unwrap();
//! ```

mod error;
#[cfg(unix)]
mod unix;
mod winsize;

use std::io;
use std::time::Duration;

pub use error::ConsoleError;
#[cfg(unix)]
pub use unix::{TermConsole, current, from_candidates, from_file, try_current};
pub use winsize::WinSize;

#[cfg(unix)]
pub type RawFd = std::os::fd::RawFd;
#[cfg(not(unix))]
pub type RawFd = isize;

/// A terminal device.
///
/// All methods take `&self` so that one handle can be shared between a reader,
/// a writer and a size poller at the same time.
pub trait Console: Send + Sync {
    /// Read raw bytes from the device
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write raw bytes to the device
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Wait up to `timeout` for input to become readable.
    ///
    /// Must return within roughly `timeout`: readers rely on it to notice
    /// shutdown instead of parking inside [`Console::read`].
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool>;

    /// Underlying file descriptor
    fn fd(&self) -> RawFd;

    /// Name of the underlying file
    fn name(&self) -> &str;

    /// Put the console in raw mode, saving the previous state for [`Console::reset`]
    fn set_raw(&self) -> Result<(), ConsoleError>;

    /// Disable echo, based on the state saved by [`Console::set_raw`]
    fn disable_echo(&self) -> Result<(), ConsoleError>;

    /// Restore the console to the state saved by [`Console::set_raw`]
    fn reset(&self) -> Result<(), ConsoleError>;

    /// Current window size
    fn size(&self) -> Result<WinSize, ConsoleError>;

    /// Resize the console to the provided window size
    fn resize(&self, size: WinSize) -> Result<(), ConsoleError>;
}
