//! Callback types and how failures inside them are surfaced.

use std::sync::Arc;

use super::output::OutputLine;
use crate::Error;

/// Receives every line from stdout and stderr, plus one [`OutputLine::Closed`] per stream.
///
/// Called from the stream-draining tasks, possibly from two tasks at once.
pub type OutputCallback = Arc<dyn Fn(&OutputLine) -> anyhow::Result<()> + Send + Sync>;

/// Receives the exit code once the process has exited and its output is drained.
pub type ExitCallback = Arc<dyn Fn(i32) -> anyhow::Result<()> + Send + Sync>;

/// Receives errors raised on background tasks that have no caller to return to.
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// The callbacks attached to one wrapper, shared with its background tasks.
#[derive(Clone, Default)]
pub(crate) struct Handlers {
    pub(crate) on_output: Option<OutputCallback>,
    pub(crate) on_exit: Option<ExitCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
}

impl Handlers {
    /// Forward a line to the output callback. Failures are logged and reported.
    pub(crate) fn output(&self, line: &OutputLine) {
        let Some(callback) = &self.on_output else {
            return;
        };

        if let Err(source) = callback(line) {
            let err = Error::OutputCallback(source);
            tracing::error!(stream = %line.stream(), error = %err, "output callback failed");
            self.report(&err);
        }
    }

    /// Invoke the exit callback. A failure is logged and handed back to the caller.
    pub(crate) fn exit(&self, code: i32) -> Result<(), Error> {
        let Some(callback) = &self.on_exit else {
            return Ok(());
        };

        callback(code).map_err(|source| {
            let err = Error::ExitCallback { code, source };
            tracing::error!(code, error = %err, "exit callback failed");
            err
        })
    }

    /// Hand an error to the error callback, if there is one.
    pub(crate) fn report(&self, err: &Error) {
        if let Some(callback) = &self.on_error {
            callback(err);
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_output", &self.on_output.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
