//! Goals: one parsed record's unit of work.
//!
//! The original prototype hierarchy is a closed variant set here: a factory
//! maps the header `type` to a variant, each variant derives its own command
//! lines from the params, and `run` pushes the resulting tasks through the
//! shared scheduler and waits for all of them.

use std::path::PathBuf;

use thiserror::Error;

use crate::classify::{self, UrlClass};
use crate::config::MaildlConfig;
use crate::parser::Header;
use crate::scheduler::SchedulerHandle;
use crate::task::{Task, TaskCompletion, TaskOutcome};

/// The one goal-level failure that is surfaced instead of swallowed:
/// the output directory could not be created, so running the downloads
/// would scatter files into the wrong place.
#[derive(Debug, Error)]
pub enum GoalError {
    #[error("creating output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Fixed downloader used by a generic-download goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downloader {
    YouGet,
    Wget,
}

impl Downloader {
    fn command<'a>(&self, cfg: &'a MaildlConfig) -> &'a str {
        match self {
            Downloader::YouGet => &cfg.commands.you_get,
            Downloader::Wget => &cfg.commands.wget,
        }
    }
}

/// Goal variants, closed over the header `type` values the factory accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    /// Params run verbatim as a single shell command.
    Generic,
    /// Params whitespace-split into URLs, one fixed downloader for all.
    Download(Downloader),
    /// Like you-get download, but bare/`av`-prefixed numeric ids are first
    /// normalized to canonical video URLs.
    Bilibili,
    /// Every URL classified independently; tasks within the goal may invoke
    /// different downloaders.
    Dispatch,
    /// Unknown `type`: completes immediately with no tasks.
    Noop,
}

/// One record's work unit. Header and params are fixed at construction; the
/// task list is a pure function of them (plus config) and never mutated
/// after submission.
#[derive(Debug)]
pub struct Goal {
    pub header: Header,
    pub params: String,
    pub kind: GoalKind,
}

impl Goal {
    /// Factory: map the header `type` to a variant. Unknown types degrade to
    /// the no-op goal rather than failing.
    pub fn from_record(header: Header, params: String) -> Goal {
        let kind = match header.get_text("type") {
            Some("download") => GoalKind::Dispatch,
            Some("bilibili") => GoalKind::Bilibili,
            Some("you-get") => GoalKind::Download(Downloader::YouGet),
            Some("wget") => GoalKind::Download(Downloader::Wget),
            Some("shell") => GoalKind::Generic,
            _ => GoalKind::Noop,
        };
        Goal {
            header,
            params,
            kind,
        }
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.params.split_whitespace()
    }

    /// Command lines this goal expands to. Pure: no directory creation, no
    /// execution (used by the dry-run CLI as well as `to_tasks`).
    pub fn commands(&self, cfg: &MaildlConfig) -> Vec<String> {
        match self.kind {
            GoalKind::Generic => {
                let cmd = self.params.trim();
                if cmd.is_empty() {
                    Vec::new()
                } else {
                    vec![cmd.to_string()]
                }
            }
            GoalKind::Download(downloader) => {
                let bin = downloader.command(cfg);
                self.tokens().map(|url| format!("{bin} '{url}'")).collect()
            }
            GoalKind::Bilibili => {
                let bin = &cfg.commands.you_get;
                self.tokens()
                    .map(|token| {
                        let url = match classify::numeric_id(token) {
                            Some(id) => classify::bilibili_url(id),
                            None => token.to_string(),
                        };
                        format!("{bin} '{url}'")
                    })
                    .collect()
            }
            GoalKind::Dispatch => self
                .tokens()
                .map(|token| dispatch_command(cfg, token))
                .collect(),
            GoalKind::Noop => Vec::new(),
        }
    }

    /// Working directory for this goal's tasks: `default_output_dir/<dir>`
    /// when the header carries a `dir`, created on the spot; otherwise the
    /// configured default. Creation failure is a goal failure, not a silent
    /// pass (downloads against a missing directory help nobody).
    fn work_dir(&self, cfg: &MaildlConfig) -> Result<PathBuf, GoalError> {
        match self.header.get_text("dir") {
            Some(dir) => {
                let path = cfg.default_output_dir.join(dir);
                std::fs::create_dir_all(&path).map_err(|source| GoalError::OutputDir {
                    path: path.clone(),
                    source,
                })?;
                Ok(path)
            }
            None => Ok(cfg.default_cwd.clone()),
        }
    }

    /// Build the task batch plus the receiving ends of their completion
    /// signals. Empty params yield an empty batch (and no directory side
    /// effect).
    pub fn to_tasks(
        &self,
        cfg: &MaildlConfig,
    ) -> Result<(Vec<Task>, Vec<TaskCompletion>), GoalError> {
        let commands = self.commands(cfg);
        if commands.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let cwd = self.work_dir(cfg)?;
        let mut tasks = Vec::with_capacity(commands.len());
        let mut waits = Vec::with_capacity(commands.len());
        for cmd in commands {
            let (task, rx) = Task::new(cmd, Some(cwd.clone()));
            tasks.push(task);
            waits.push(rx);
        }
        Ok((tasks, waits))
    }

    /// Submit this goal's tasks as one batch and wait for every completion.
    /// Resolves exactly once with the collected outcomes; a no-op goal
    /// resolves immediately with an empty list.
    pub async fn run(
        self,
        sched: &SchedulerHandle,
        cfg: &MaildlConfig,
    ) -> Result<Vec<TaskOutcome>, GoalError> {
        let kind = self.kind;
        let (tasks, waits) = self.to_tasks(cfg)?;
        if !tasks.is_empty() {
            sched.submit(tasks);
        }

        let mut outcomes = Vec::with_capacity(waits.len());
        for rx in waits {
            let outcome = rx.await.unwrap_or_else(|_| {
                TaskOutcome::Failed("scheduler dropped before completion".to_string())
            });
            outcomes.push(outcome);
        }
        tracing::debug!(?kind, tasks = outcomes.len(), "goal done");
        Ok(outcomes)
    }
}

fn dispatch_command(cfg: &MaildlConfig, token: &str) -> String {
    match classify::classify(token) {
        UrlClass::Bilibili { id } => format!(
            "{} '{}'",
            cfg.commands.you_get,
            classify::bilibili_url(&id)
        ),
        UrlClass::YouGet => format!("{} '{}'", cfg.commands.you_get, token),
        UrlClass::Wget => format!("{} -c '{}'", cfg.commands.wget, token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultHeader;
    use crate::parser;

    fn cfg() -> MaildlConfig {
        MaildlConfig::default()
    }

    fn goal_for(record: &str) -> Goal {
        let (header, params) = parser::parse_record(record, &DefaultHeader::default());
        Goal::from_record(header, params)
    }

    #[test]
    fn factory_maps_types_to_variants() {
        assert_eq!(goal_for("#type: download\nx").kind, GoalKind::Dispatch);
        assert_eq!(goal_for("#type: bilibili\nx").kind, GoalKind::Bilibili);
        assert_eq!(
            goal_for("#type: you-get\nx").kind,
            GoalKind::Download(Downloader::YouGet)
        );
        assert_eq!(
            goal_for("#type: wget\nx").kind,
            GoalKind::Download(Downloader::Wget)
        );
        assert_eq!(goal_for("#type: shell\nx").kind, GoalKind::Generic);
        assert_eq!(goal_for("#type: mystery\nx").kind, GoalKind::Noop);
    }

    #[test]
    fn default_type_dispatches() {
        assert_eq!(goal_for("http://a http://b").kind, GoalKind::Dispatch);
    }

    #[test]
    fn download_goal_one_task_per_token() {
        let goal = goal_for("#type: you-get\nhttp://a\nhttp://b http://c");
        assert_eq!(
            goal.commands(&cfg()),
            vec![
                "you-get 'http://a'",
                "you-get 'http://b'",
                "you-get 'http://c'"
            ]
        );
    }

    #[test]
    fn bilibili_goal_normalizes_numeric_ids() {
        let goal = goal_for("#type: bilibili\nav42 77 http://other/x");
        assert_eq!(
            goal.commands(&cfg()),
            vec![
                "you-get 'https://www.bilibili.com/video/av42'",
                "you-get 'https://www.bilibili.com/video/av77'",
                "you-get 'http://other/x'"
            ]
        );
    }

    #[test]
    fn dispatch_goal_picks_downloader_per_url() {
        let goal = goal_for("9999 http://www.youtube.com/v http://random.nowhere/x");
        assert_eq!(
            goal.commands(&cfg()),
            vec![
                "you-get 'https://www.bilibili.com/video/av9999'",
                "you-get 'http://www.youtube.com/v'",
                "wget -c 'http://random.nowhere/x'"
            ]
        );
    }

    #[test]
    fn generic_goal_runs_params_verbatim() {
        let goal = goal_for("#type: shell\ntar xf archive.tar -C /srv");
        assert_eq!(goal.commands(&cfg()), vec!["tar xf archive.tar -C /srv"]);
    }

    #[test]
    fn empty_params_yield_no_tasks() {
        assert!(goal_for("").commands(&cfg()).is_empty());
        assert!(goal_for("#type: you-get").commands(&cfg()).is_empty());
        assert!(goal_for("#type: mystery\nstuff").commands(&cfg()).is_empty());
    }

    // The two-record message from the design discussion: numeric ids under
    // the default dispatching type, then a forced you-get record.
    #[test]
    fn mixed_message_example() {
        let content = "av1234\n5678\n\n#type: you-get\nhttp://example.com/x\n";
        let records = parser::parse_content(content);
        assert_eq!(records.len(), 2);

        let first = goal_for(&records[0]);
        assert_eq!(first.kind, GoalKind::Dispatch);
        assert_eq!(
            first.commands(&cfg()),
            vec![
                "you-get 'https://www.bilibili.com/video/av1234'",
                "you-get 'https://www.bilibili.com/video/av5678'"
            ]
        );

        let second = goal_for(&records[1]);
        assert_eq!(second.kind, GoalKind::Download(Downloader::YouGet));
        assert_eq!(second.commands(&cfg()), vec!["you-get 'http://example.com/x'"]);
    }

    #[test]
    fn work_dir_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file in the way").unwrap();

        let mut cfg = MaildlConfig::default();
        cfg.default_output_dir = blocker;

        let goal = goal_for("#type: you-get, dir: sub\nhttp://a");
        let err = goal.to_tasks(&cfg).unwrap_err();
        assert!(matches!(err, GoalError::OutputDir { .. }));
    }

    #[tokio::test]
    async fn noop_goal_completes_immediately() {
        let sched = SchedulerHandle::spawn(1);
        // Never started: a no-op goal must still resolve.
        let goal = goal_for("#type: mystery\nwhatever");
        let outcomes = goal.run(&sched, &cfg()).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn goal_resolves_after_all_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = MaildlConfig::default();
        cfg.default_output_dir = dir.path().join("out");
        cfg.commands.you_get = "echo".to_string();

        let sched = SchedulerHandle::spawn(2);
        sched.start();

        let goal = goal_for("#type: you-get, dir: vids\nhttp://a http://b http://c");
        let outcomes = goal.run(&sched, &cfg).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(TaskOutcome::is_success));
        assert!(dir.path().join("out").join("vids").is_dir());
    }
}
