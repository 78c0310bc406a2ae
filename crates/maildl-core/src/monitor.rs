//! Pending-directory monitor: a cancellable periodic poll that diffs the
//! current listing against the last one and reports only new names. No
//! ordering is assumed from the filesystem; batches are sorted for stable
//! logs only.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};

use crate::mailbox;

pub struct Monitor {
    dir: PathBuf,
    seen: HashSet<String>,
}

impl Monitor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seen: HashSet::new(),
        }
    }

    /// One poll: list the directory, report names absent from the previous
    /// listing, and remember the current one. A name removed and later
    /// re-added counts as new again. The very first poll reports everything
    /// already present (the backlog).
    pub fn poll_new(&mut self) -> Result<Vec<String>> {
        let current: HashSet<String> = mailbox::list_messages(&self.dir)?.into_iter().collect();
        let mut new_files: Vec<String> = current.difference(&self.seen).cloned().collect();
        new_files.sort();
        self.seen = current;
        Ok(new_files)
    }

    /// Poll every `period`, sending non-empty batches of new names to `tx`,
    /// until `shutdown` flips or the receiver goes away. Listing errors are
    /// logged and polling continues.
    pub async fn watch(
        mut self,
        period: Duration,
        tx: mpsc::UnboundedSender<Vec<String>>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => match self.poll_new() {
                    Ok(new_files) if !new_files.is_empty() => {
                        tracing::debug!(count = new_files.len(), "new mail");
                        if tx.send(new_files).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(dir = %self.dir.display(), error = %e, "mail dir poll failed");
                    }
                },
                _ = shutdown.changed() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn first_poll_reports_backlog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m2"), b"").unwrap();
        fs::write(dir.path().join("m1"), b"").unwrap();

        let mut monitor = Monitor::new(dir.path());
        assert_eq!(monitor.poll_new().unwrap(), vec!["m1", "m2"]);
        assert!(monitor.poll_new().unwrap().is_empty());
    }

    #[test]
    fn only_new_names_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m1"), b"").unwrap();

        let mut monitor = Monitor::new(dir.path());
        monitor.poll_new().unwrap();

        fs::write(dir.path().join("m2"), b"").unwrap();
        assert_eq!(monitor.poll_new().unwrap(), vec!["m2"]);
    }

    #[test]
    fn removed_and_readded_counts_as_new() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("m1"), b"").unwrap();

        let mut monitor = Monitor::new(dir.path());
        monitor.poll_new().unwrap();

        fs::remove_file(dir.path().join("m1")).unwrap();
        assert!(monitor.poll_new().unwrap().is_empty());

        fs::write(dir.path().join("m1"), b"").unwrap();
        assert_eq!(monitor.poll_new().unwrap(), vec!["m1"]);
    }

    #[test]
    fn directories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("new")).unwrap();

        let mut monitor = Monitor::new(dir.path());
        assert!(monitor.poll_new().unwrap().is_empty());
    }

    #[tokio::test]
    async fn watch_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        fs::write(dir.path().join("m1"), b"").unwrap();
        let monitor = Monitor::new(dir.path());
        let handle = tokio::spawn(monitor.watch(
            Duration::from_millis(10),
            tx,
            shutdown_rx,
        ));

        // First tick fires immediately and carries the backlog.
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch, vec!["m1"]);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
