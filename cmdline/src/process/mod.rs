//! Running one external process with callback-driven output and exit.
//!
//! ```text
//! ProcessWrapper                        child process
//! ┌──────────────┐                     ┌─────────────┐
//! │ drain task   │◀──── stdout ────────│             │
//! │ drain task   │◀──── stderr ────────│             │
//! │ monitor task │◀──── exit status ───│             │
//! └──────────────┘                     └─────────────┘
//!   on_output(line)   per line, per stream in order
//!   on_exit(code)     after both streams are drained
//!   start_async       resolves after on_exit returns
//! ```

mod handlers;
mod output;
mod spawn;
mod wrapper;

pub use handlers::{ErrorCallback, ExitCallback, OutputCallback};
pub use output::{OutputLine, Stream};
pub use spawn::{exit_code, split_args, UNKNOWN_EXIT_CODE};
pub use wrapper::ProcessWrapper;
