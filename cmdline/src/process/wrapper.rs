//! A wrapper that owns one external process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::process::Child;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::handlers::{ErrorCallback, ExitCallback, Handlers, OutputCallback};
use super::output::{drain_lines, OutputLine, Stream};
use super::spawn::{build_command, exit_code};
use crate::models::ProcessState;
use crate::{Error, Result};

/// Sender half of the per-`start_async` completion signal.
type Completion = oneshot::Sender<Result<i32>>;

/// Runs one external command and reports its output and exit through callbacks.
///
/// Output from stdout and stderr is delivered line by line to the output
/// callback as it arrives. Once the process has exited and both streams are
/// drained, the exit callback receives the exit code. [`start_async`] also
/// resolves with that code, strictly after the exit callback returned.
///
/// A wrapper runs at most one process. Dropping it does not kill the child.
///
/// # Example
///
/// ```rust,no_run
/// use cmdline::{OutputLine, ProcessWrapper};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut build = ProcessWrapper::new("cargo", ".")
///         .on_output(|line: &OutputLine| {
///             if let Some(text) = line.text() {
///                 println!("{text}");
///             }
///             Ok(())
///         })
///         .on_exit(|code| {
///             println!("cargo exited with {code}");
///             Ok(())
///         });
///
///     let code = build.start_async("build --release").await?;
///     std::process::exit(code);
/// }
/// ```
///
/// [`start_async`]: ProcessWrapper::start_async
pub struct ProcessWrapper {
    id: Uuid,
    program: String,
    working_dir: PathBuf,
    env: HashMap<String, String>,
    args: String,
    handlers: Handlers,
    pid: Option<u32>,
    started_at: Option<DateTime<Utc>>,
    state: watch::Receiver<ProcessState>,
    /// Present until a process is spawned; moved into the monitor task.
    state_tx: Option<watch::Sender<ProcessState>>,
}

impl ProcessWrapper {
    /// Create a wrapper for `program`, to be run inside `working_dir`.
    ///
    /// Neither the program nor the directory is checked here.
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        let (state_tx, state) = watch::channel(ProcessState::Created);
        Self {
            id: Uuid::now_v7(),
            program: program.into(),
            working_dir: working_dir.into(),
            env: HashMap::new(),
            args: String::new(),
            handlers: Handlers::default(),
            pid: None,
            started_at: None,
            state,
            state_tx: Some(state_tx),
        }
    }

    /// Create a wrapper with both callbacks given up front, either of which may be absent.
    pub fn with_callbacks(
        program: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        on_output: Option<OutputCallback>,
        on_exit: Option<ExitCallback>,
    ) -> Self {
        let mut wrapper = Self::new(program, working_dir);
        wrapper.handlers.on_output = on_output;
        wrapper.handlers.on_exit = on_exit;
        wrapper
    }

    /// Set the callback that receives every output line.
    pub fn on_output<F>(mut self, callback: F) -> Self
    where
        F: Fn(&OutputLine) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.on_output = Some(Arc::new(callback));
        self
    }

    /// Set the callback that receives the exit code.
    pub fn on_exit<F>(mut self, callback: F) -> Self
    where
        F: Fn(i32) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.on_exit = Some(Arc::new(callback));
        self
    }

    /// Set the callback that receives errors from the background tasks.
    ///
    /// This covers failed callbacks and unreadable streams. An exit callback
    /// failure goes to the [`start_async`](Self::start_async) future instead
    /// when one is waiting.
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.handlers.on_error = Some(Arc::new(callback) as ErrorCallback);
        self
    }

    /// Set an environment variable for the process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Start the process with `args` and return without waiting for it.
    ///
    /// If the working directory does not exist nothing happens: no process,
    /// no callbacks, no error. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyStarted`] if this wrapper already spawned a process,
    /// [`Error::InvalidArguments`] for an unbalanced quote in `args` (Unix), and
    /// [`Error::Spawn`] when the OS cannot start the program.
    pub fn start(&mut self, args: &str) -> Result<()> {
        self.launch(args, None).map(|_| ())
    }

    /// Start the process with no arguments.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub fn start_default(&mut self) -> Result<()> {
        self.start("")
    }

    /// Start the process and wait for its exit code.
    ///
    /// Resolves after all output has been delivered and the exit callback
    /// has returned.
    ///
    /// # Errors
    ///
    /// Everything [`start`](Self::start) returns, plus
    /// [`Error::WorkingDirectoryNotFound`] when there is nothing to wait for,
    /// [`Error::ExitCallback`] when the exit callback failed, and
    /// [`Error::MonitorLost`] when the exit could not be observed.
    pub async fn start_async(&mut self, args: &str) -> Result<i32> {
        let (tx, rx) = oneshot::channel();

        if !self.launch(args, Some(tx))? {
            return Err(Error::WorkingDirectoryNotFound(self.working_dir.clone()));
        }

        rx.await.map_err(|_| Error::MonitorLost)?
    }

    /// Wait until the process has terminated and return its exit code.
    ///
    /// Returns `Ok(None)` straight away if no process was ever started.
    ///
    /// # Errors
    ///
    /// [`Error::MonitorLost`] if the monitor task ended without an exit code.
    pub async fn wait_for_exit(&self) -> Result<Option<i32>> {
        if *self.state.borrow() == ProcessState::Created {
            return Ok(None);
        }

        let mut state = self.state.clone();
        let terminated = state
            .wait_for(|s| s.is_terminated())
            .await
            .map_err(|_| Error::MonitorLost)?;

        Ok(terminated.exit_code())
    }

    /// Spawn the process unless the working directory is missing.
    ///
    /// Returns whether a process was spawned.
    fn launch(&mut self, args: &str, completion: Option<Completion>) -> Result<bool> {
        if self.state_tx.is_none() {
            return Err(Error::AlreadyStarted);
        }

        self.args = args.to_string();

        if !self.working_dir.is_dir() {
            tracing::debug!(
                run = %self.id,
                working_dir = %self.working_dir.display(),
                "working directory missing, not starting process"
            );
            return Ok(false);
        }

        let mut child = build_command(&self.program, args, &self.working_dir, &self.env)?
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        self.pid = child.id();
        self.started_at = Some(Utc::now());
        tracing::debug!(run = %self.id, program = %self.program, pid = ?self.pid, "spawned process");

        let handlers = Arc::new(self.handlers.clone());
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(drain_lines(stdout, Stream::Stdout, Arc::clone(&handlers))));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(drain_lines(stderr, Stream::Stderr, Arc::clone(&handlers))));
        }

        let state_tx = self.state_tx.take().ok_or(Error::AlreadyStarted)?;
        state_tx.send_replace(ProcessState::Running);

        tokio::spawn(monitor(self.id, child, readers, handlers, state_tx, completion));

        Ok(true)
    }

    /// Identifier of this wrapper, used to correlate log events.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The program this wrapper runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Directory the process is started in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The argument string passed to the most recent start.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Whether an output callback is set.
    pub const fn has_output_callback(&self) -> bool {
        self.handlers.on_output.is_some()
    }

    /// Whether an exit callback is set.
    pub const fn has_exit_callback(&self) -> bool {
        self.handlers.on_exit.is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    /// The exit code, once the process has terminated.
    pub fn exit_code(&self) -> Option<i32> {
        self.state().exit_code()
    }

    /// OS process id, once spawned.
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// When the process was spawned.
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

impl std::fmt::Debug for ProcessWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessWrapper")
            .field("id", &self.id)
            .field("program", &self.program)
            .field("working_dir", &self.working_dir)
            .field("args", &self.args)
            .field("state", &self.state())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// Wait for the process to exit, then notify in order: exit callback,
/// published state, completion signal.
async fn monitor(
    run: Uuid,
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    handlers: Arc<Handlers>,
    state: watch::Sender<ProcessState>,
    completion: Option<Completion>,
) {
    let outcome = match child.wait().await {
        Ok(status) => {
            // Exit is only reported once every buffered line has been delivered.
            for reader in readers {
                if let Err(e) = reader.await {
                    tracing::warn!(%run, error = %e, "output reader task failed");
                }
            }

            let code = exit_code(status);
            tracing::debug!(%run, code, "process exited");

            let delivered = handlers.exit(code);
            state.send_replace(ProcessState::Terminated(code));
            delivered.map(|()| code)
        }
        Err(source) => {
            let err = Error::Wait(source);
            tracing::error!(%run, error = %err, "lost track of process");
            Err(err)
        }
    };

    let undelivered = match completion {
        Some(tx) => tx.send(outcome).err(),
        None => Some(outcome),
    };

    if let Some(Err(err)) = undelivered {
        handlers.report(&err);
    }
}
