//! Bounded-concurrency FIFO executor for external download commands.
//!
//! One actor task owns all scheduling state (pending queue, running set,
//! enabled flag); every job and goal submits into the same handle, which is
//! what makes the concurrency limit global rather than per-job. Commands run
//! out-of-process via `sh -c`; the actor itself never blocks on them.
//!
//! Ordering on completion is deliberate: free the slot and re-dispatch
//! first, resolve the finished task's completion signal after, so a
//! submission triggered by the completion finds the slot already available.

use std::collections::{HashMap, VecDeque};

use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use crate::task::{Task, TaskOutcome};

/// OS signal number (e.g. `libc::SIGTERM`).
pub type Signal = i32;

/// Snapshot of scheduler state, for tests and status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub queued: usize,
    pub running: usize,
    pub enabled: bool,
}

enum Msg {
    Submit(Vec<Task>),
    Start,
    Stop,
    Kill(Signal),
    Stats(oneshot::Sender<SchedulerStats>),
    Exited {
        pid: u32,
        outcome: TaskOutcome,
        done: oneshot::Sender<TaskOutcome>,
    },
}

/// Cloneable handle to the scheduler actor. All methods are fire-and-forget
/// sends; a dropped actor turns them into no-ops and pending completions
/// resolve as failures on the receiving side.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Msg>,
}

impl SchedulerHandle {
    /// Spawn the scheduler actor with the given concurrency limit (clamped
    /// to at least 1). The scheduler starts stopped; call `start`.
    pub fn spawn(limit: usize) -> SchedulerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Scheduler {
            limit: limit.max(1),
            enabled: false,
            queue: VecDeque::new(),
            running: HashMap::new(),
            tx: tx.clone(),
        };
        tokio::spawn(actor.run(rx));
        SchedulerHandle { tx }
    }

    /// Append a batch of tasks to the pending queue as one atomic unit;
    /// dispatches immediately when running.
    pub fn submit(&self, tasks: Vec<Task>) {
        let _ = self.tx.send(Msg::Submit(tasks));
    }

    pub fn submit_one(&self, task: Task) {
        self.submit(vec![task]);
    }

    /// Enable dispatch and drain the queue up to the limit.
    pub fn start(&self) {
        let _ = self.tx.send(Msg::Start);
    }

    /// Disable dispatch. Running tasks are not interrupted; submissions are
    /// still accepted and queue up.
    pub fn stop(&self) {
        let _ = self.tx.send(Msg::Stop);
    }

    /// Stop dispatch, send `signal` to every running task's process, and
    /// clear the running set immediately. Does not wait for the processes to
    /// exit; their completion signals resolve when they actually do.
    pub fn kill(&self, signal: Signal) {
        let _ = self.tx.send(Msg::Kill(signal));
    }

    /// Current queue/running counts. None if the actor is gone.
    pub async fn stats(&self) -> Option<SchedulerStats> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(Msg::Stats(tx)).ok()?;
        rx.await.ok()
    }
}

struct Scheduler {
    limit: usize,
    enabled: bool,
    queue: VecDeque<Task>,
    running: HashMap<u32, String>,
    tx: mpsc::UnboundedSender<Msg>,
}

impl Scheduler {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                Msg::Submit(tasks) => {
                    self.queue.extend(tasks);
                    self.dispatch();
                }
                Msg::Start => {
                    self.enabled = true;
                    self.dispatch();
                }
                Msg::Stop => {
                    self.enabled = false;
                }
                Msg::Kill(signal) => {
                    self.enabled = false;
                    for (pid, cmd) in self.running.drain() {
                        tracing::info!(pid, signal, cmd = %cmd, "signalling running task");
                        send_signal(pid, signal);
                    }
                }
                Msg::Stats(reply) => {
                    let _ = reply.send(SchedulerStats {
                        queued: self.queue.len(),
                        running: self.running.len(),
                        enabled: self.enabled,
                    });
                }
                Msg::Exited { pid, outcome, done } => {
                    // Slot first, completion second: see module docs.
                    if self.running.remove(&pid).is_some() {
                        self.dispatch();
                    }
                    tracing::debug!(pid, success = outcome.is_success(), "task done");
                    let _ = done.send(outcome);
                }
            }
        }
    }

    /// Pop and launch queue heads while enabled and a slot is free.
    fn dispatch(&mut self) {
        while self.enabled && self.running.len() < self.limit {
            let Some(task) = self.queue.pop_front() else {
                break;
            };
            self.launch(task);
        }
    }

    fn launch(&mut self, task: Task) {
        let mut command = Command::new("sh");
        command.arg("-c").arg(&task.cmd);
        if let Some(dir) = &task.cwd {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                // Never occupies a slot and never aborts siblings: the fault
                // becomes the task's outcome value.
                tracing::warn!(cmd = %task.cmd, error = %e, "spawn failed");
                let _ = task.done.send(TaskOutcome::Failed(format!("spawn failed: {e}")));
                return;
            }
        };

        // id() is Some until the child has been reaped, which cannot have
        // happened yet.
        let pid = child.id().unwrap_or(0);
        tracing::debug!(pid, cmd = %task.cmd, "executing");
        self.running.insert(pid, task.cmd);

        let tx = self.tx.clone();
        let done = task.done;
        tokio::spawn(async move {
            let outcome = match child.wait().await {
                Ok(status) if status.success() => TaskOutcome::Success,
                Ok(status) => TaskOutcome::Failed(status.to_string()),
                Err(e) => TaskOutcome::Failed(format!("wait failed: {e}")),
            };
            let _ = tx.send(Msg::Exited { pid, outcome, done });
        });
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: Signal) {
    let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
    if rc != 0 {
        tracing::warn!(pid, signal, "kill(2) failed: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn send_signal(pid: u32, _signal: Signal) {
    tracing::warn!(pid, "signal delivery not supported on this platform");
}
