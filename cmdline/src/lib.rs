//! # cmdline
//!
//! Run an external command and follow it through callbacks.
//!
//! A [`ProcessWrapper`] launches one program, streams each line it writes to
//! stdout or stderr into an output callback, and hands the exit code to an
//! exit callback once the process is gone and its output drained.
//! [`ProcessWrapper::start_async`] does the same and also resolves with the
//! exit code.
//!
//! ```rust,no_run
//! use cmdline::{OutputLine, ProcessWrapper};
//!
//! # async fn run() -> cmdline::Result<()> {
//! let mut git = ProcessWrapper::new("git", ".")
//!     .on_output(|line: &OutputLine| {
//!         if let Some(text) = line.text() {
//!             println!("[{}] {text}", line.stream());
//!         }
//!         Ok(())
//!     });
//!
//! let code = git.start_async("status --short").await?;
//! assert_eq!(code, 0);
//! # Ok(())
//! # }
//! ```
//!
//! Callbacks run on tokio tasks. Errors they return are logged with
//! `tracing` and then passed to the error callback (see
//! [`ProcessWrapper::on_error`]) or, for the exit callback, to the pending
//! `start_async` future.

pub mod config;
mod error;
pub mod models;
pub mod process;

pub use error::{Error, Result};
pub use models::{ProcessState, RunReport};
pub use process::{ExitCallback, OutputCallback, OutputLine, ProcessWrapper, Stream};
