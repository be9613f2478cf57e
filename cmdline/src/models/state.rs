//! Lifecycle state of a wrapped process.

use serde::Serialize;

/// Where a wrapped process is in its lifecycle.
///
/// Moves only forward: `Created → Running → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "code")]
pub enum ProcessState {
    /// Not started, or start was a no-op because the working directory is missing.
    #[default]
    Created,
    /// Spawned and not yet reported as exited.
    Running,
    /// Exited with the given code; output drained and exit callback done.
    Terminated(i32),
}

impl ProcessState {
    /// Lowercase name of the state, without the exit code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Terminated(_) => "terminated",
        }
    }

    /// The exit code, once terminated.
    pub const fn exit_code(self) -> Option<i32> {
        match self {
            Self::Terminated(code) => Some(code),
            _ => None,
        }
    }

    /// Whether the process has exited and been fully reported.
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Terminated(code) => write!(f, "terminated ({code})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_only_when_terminated() {
        assert_eq!(ProcessState::Created.exit_code(), None);
        assert_eq!(ProcessState::Running.exit_code(), None);
        assert_eq!(ProcessState::Terminated(3).exit_code(), Some(3));
        assert!(ProcessState::Terminated(0).is_terminated());
        assert!(!ProcessState::Running.is_terminated());
    }

    #[test]
    fn test_display() {
        assert_eq!(ProcessState::Created.to_string(), "created");
        assert_eq!(ProcessState::Terminated(1).to_string(), "terminated (1)");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ProcessState::Terminated(2)).unwrap();
        assert_eq!(json, r#"{"state":"terminated","code":2}"#);

        let json = serde_json::to_string(&ProcessState::Running).unwrap();
        assert_eq!(json, r#"{"state":"running"}"#);
    }
}
