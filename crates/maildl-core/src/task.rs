//! A task is one external command invocation tracked to completion.

use std::path::PathBuf;
use tokio::sync::oneshot;

/// Captured result of one external command. A failed download is ordinary
/// completion data, never an error that could abort sibling tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Non-zero exit, termination by signal, or spawn failure.
    Failed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Receives the task's outcome exactly once, when the process has exited
/// (or the spawn failed).
pub type TaskCompletion = oneshot::Receiver<TaskOutcome>;

/// One shell command plus its completion signal. Owned by the goal that
/// built it until submission, then by the scheduler for its running lifetime.
#[derive(Debug)]
pub struct Task {
    /// Full shell command line, executed via `sh -c`.
    pub cmd: String,
    /// Working directory for the spawned process (None = inherit).
    pub cwd: Option<PathBuf>,
    pub(crate) done: oneshot::Sender<TaskOutcome>,
}

impl Task {
    /// Create a task and the receiving end of its completion signal.
    pub fn new(cmd: impl Into<String>, cwd: Option<PathBuf>) -> (Self, TaskCompletion) {
        let (done, rx) = oneshot::channel();
        (
            Self {
                cmd: cmd.into(),
                cwd,
                done,
            },
            rx,
        )
    }
}
