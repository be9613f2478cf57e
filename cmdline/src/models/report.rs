//! Summary of one finished (or never started) run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ProcessWrapper;

/// What happened when a wrapper ran its process.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Wrapper id (`UUIDv7`).
    pub run_id: String,
    /// Program that was run.
    pub program: String,
    /// Working directory it was run in.
    pub working_dir: String,
    /// Argument string it was started with.
    pub args: String,
    /// Final lifecycle state (`created`, `running` or `terminated`).
    pub state: String,
    /// Exit code, if the process terminated.
    pub exit_code: Option<i32>,
    /// Number of lines read from stdout.
    pub stdout_lines: usize,
    /// Number of lines read from stderr.
    pub stderr_lines: usize,
    /// When the process was spawned.
    pub started_at: Option<DateTime<Utc>>,
    /// When the report was taken.
    pub finished_at: DateTime<Utc>,
    /// Milliseconds between spawn and report.
    pub duration_ms: Option<i64>,
}

impl RunReport {
    /// Snapshot a wrapper, together with the line counts its output callback saw.
    pub fn from_wrapper(wrapper: &ProcessWrapper, stdout_lines: usize, stderr_lines: usize) -> Self {
        let finished_at = Utc::now();
        let started_at = wrapper.started_at();
        let state = wrapper.state();

        Self {
            run_id: wrapper.id().to_string(),
            program: wrapper.program().to_string(),
            working_dir: wrapper.working_dir().display().to_string(),
            args: wrapper.args().to_string(),
            state: state.as_str().to_string(),
            exit_code: state.exit_code(),
            stdout_lines,
            stderr_lines,
            started_at,
            finished_at,
            duration_ms: started_at.map(|start| (finished_at - start).num_milliseconds()),
        }
    }

    /// Whether the process terminated with exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProcessState;

    #[test]
    fn test_report_for_unstarted_wrapper() {
        let wrapper = ProcessWrapper::new("echo", "/no/such/dir");
        let report = RunReport::from_wrapper(&wrapper, 0, 0);

        assert_eq!(report.program, "echo");
        assert_eq!(report.working_dir, "/no/such/dir");
        assert_eq!(report.state, ProcessState::Created.as_str());
        assert_eq!(report.exit_code, None);
        assert_eq!(report.started_at, None);
        assert_eq!(report.duration_ms, None);
        assert!(!report.success());
    }

    #[tokio::test]
    async fn test_report_after_run() {
        let mut wrapper = ProcessWrapper::new("echo", ".");
        wrapper.start_async("hello").await.unwrap();

        let report = RunReport::from_wrapper(&wrapper, 1, 0);
        assert!(report.success());
        assert_eq!(report.args, "hello");
        assert!(report.duration_ms.is_some_and(|ms| ms >= 0));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "terminated");
        assert_eq!(json["exit_code"], 0);
        assert_eq!(json["stdout_lines"], 1);
    }
}
