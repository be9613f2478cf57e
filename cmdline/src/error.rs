//! Error types for the process wrapper.

use std::path::PathBuf;

use crate::process::Stream;

/// Errors produced while starting, draining or monitoring a wrapped process.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The wrapper already owns a process.
    #[error("process already started")]
    AlreadyStarted,

    /// The configured working directory does not exist.
    ///
    /// Only surfaced by [`ProcessWrapper::start_async`](crate::ProcessWrapper::start_async);
    /// a plain `start` ignores the missing directory.
    #[error("working directory not found: {}", .0.display())]
    WorkingDirectoryNotFound(PathBuf),

    /// The argument string could not be split into words.
    #[error("invalid argument string {args:?}: {source}")]
    InvalidArguments {
        args: String,
        #[source]
        source: shell_words::ParseError,
    },

    /// The OS refused to spawn the program.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the exit status failed.
    #[error("failed to wait for process exit: {0}")]
    Wait(#[source] std::io::Error),

    /// Reading a captured stream failed.
    #[error("failed to read {stream}: {source}")]
    Read {
        stream: Stream,
        #[source]
        source: std::io::Error,
    },

    /// The output callback returned an error.
    #[error("output callback failed: {0:#}")]
    OutputCallback(#[source] anyhow::Error),

    /// The exit callback returned an error.
    #[error("exit callback failed for exit code {code}: {source:#}")]
    ExitCallback {
        code: i32,
        #[source]
        source: anyhow::Error,
    },

    /// The monitor task ended without reporting an exit code.
    #[error("process monitor ended without reporting an exit code")]
    MonitorLost,
}

/// A specialized Result type for cmdline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error came from a user-supplied callback.
    pub const fn is_callback_error(&self) -> bool {
        matches!(self, Self::OutputCallback(_) | Self::ExitCallback { .. })
    }

    /// The exit code carried by the error, if the process got far enough to have one.
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitCallback { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn callback_error_detection() {
        assert!(Error::OutputCallback(anyhow::anyhow!("boom")).is_callback_error());
        assert!(Error::ExitCallback {
            code: 3,
            source: anyhow::anyhow!("boom"),
        }
        .is_callback_error());
        assert!(!Error::AlreadyStarted.is_callback_error());
        assert!(!Error::MonitorLost.is_callback_error());
    }

    #[test]
    fn exit_code_only_on_exit_callback() {
        let err = Error::ExitCallback {
            code: 7,
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.exit_code(), Some(7));
        assert_eq!(Error::AlreadyStarted.exit_code(), None);
    }

    #[test]
    fn display_includes_context() {
        let err = Error::WorkingDirectoryNotFound(PathBuf::from("/no/such/dir"));
        assert_eq!(err.to_string(), "working directory not found: /no/such/dir");

        let err = Error::ExitCallback {
            code: 2,
            source: anyhow::anyhow!("disk full").context("writing log"),
        };
        assert_eq!(
            err.to_string(),
            "exit callback failed for exit code 2: writing log: disk full"
        );
    }
}
