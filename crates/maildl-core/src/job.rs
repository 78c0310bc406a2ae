//! A job is one inbound message's unit of work: the goals parsed from its
//! body plus the "move to done" finalization once every goal has completed.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::MaildlConfig;
use crate::goal::Goal;
use crate::mailbox;
use crate::parser;
use crate::scheduler::SchedulerHandle;

/// Parse a message body into one goal per record.
pub fn content_to_goals(content: &str, cfg: &MaildlConfig) -> Vec<Goal> {
    parser::parse_content(content)
        .iter()
        .map(|record| {
            let (header, params) = parser::parse_record(record, &cfg.default_header);
            Goal::from_record(header, params)
        })
        .collect()
}

pub struct Job {
    mail_id: String,
    goals: Vec<Goal>,
}

impl Job {
    pub fn new(mail_id: impl Into<String>, content: &str, cfg: &MaildlConfig) -> Job {
        Job {
            mail_id: mail_id.into(),
            goals: content_to_goals(content, cfg),
        }
    }

    pub fn mail_id(&self) -> &str {
        &self.mail_id
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Run every goal concurrently (all submitting into the same scheduler),
    /// wait for all of them, then move the message to the done directory.
    /// Failed goals and failed tasks are logged and never block the rest;
    /// only the final rename propagates an error.
    pub async fn run(self, sched: SchedulerHandle, cfg: Arc<MaildlConfig>) -> Result<()> {
        let mail_id = self.mail_id;
        let mut set = JoinSet::new();
        for goal in self.goals {
            let sched = sched.clone();
            let cfg = Arc::clone(&cfg);
            set.spawn(async move { goal.run(&sched, &cfg).await });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(outcomes)) => {
                    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
                    if failed > 0 {
                        tracing::warn!(
                            mail = %mail_id,
                            failed,
                            total = outcomes.len(),
                            "goal finished with failed tasks"
                        );
                    }
                }
                Ok(Err(e)) => tracing::warn!(mail = %mail_id, error = %e, "goal failed"),
                Err(e) => tracing::warn!(mail = %mail_id, error = %e, "goal join failed"),
            }
        }

        mailbox::mark_done(&cfg, &mail_id)
            .with_context(|| format!("finalizing mail {mail_id}"))?;
        tracing::info!(mail = %mail_id, "mail done");
        Ok(())
    }
}
