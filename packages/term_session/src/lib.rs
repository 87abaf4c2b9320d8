//! Terminal session - raw-mode console sessions with size tracking
//!
//! A [`Terminal`] puts a console into raw mode, polls it for size changes and
//! watches its input for an exit sentinel (Ctrl-] by default). The console is
//! restored exactly once when the session closes, whether that is an explicit
//! [`Terminal::close`], the sentinel, the end of input, or drop.
//!
//! # Example
//!
//! ```no_run
//! use term_session::{CancellationToken, Terminal};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cancel = CancellationToken::new();
//!     let term = Terminal::new(cancel.clone()).unwrap();
//!
//!     let sizes = term.watch_size();
//!     tokio::spawn(async move {
//!         while let Some(size) = sizes.recv().await {
//!             eprintln!("resized to {}", size);
//!         }
//!     });
//!
//!     // Echo input until Ctrl-] closes the session
//!     let mut buf = [0u8; 512];
//!     loop {
//!         let n = term.read(&mut buf).await.unwrap();
//!         if n == 0 || term.is_closed() {
//!             break;
//!         }
//!         term.write_all(&buf[..n]).await.unwrap();
//!     }
//!     cancel.cancel();
//! }
//! ```

mod config;
mod error;
mod poller;
mod session;
mod size;
mod tee;
mod watcher;

pub use config::{DEFAULT_EXIT_RUNE, TermConfig};
pub use console_handle::{Console, ConsoleError, WinSize};
pub use error::TermError;
pub use session::Terminal;
pub use size::{Size, SizeWatcher};
pub use tokio_util::sync::CancellationToken;
