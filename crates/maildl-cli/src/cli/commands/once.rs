//! `maildl once` – drain the current pending backlog and exit.

use anyhow::Result;
use std::sync::Arc;

use maildl_core::config::MaildlConfig;
use maildl_core::job::Job;
use maildl_core::mailbox;
use maildl_core::scheduler::SchedulerHandle;
use tokio::task::JoinSet;

pub async fn run_once(cfg: MaildlConfig) -> Result<()> {
    let files = mailbox::list_messages(&cfg.mail_dir)?;
    if files.is_empty() {
        tracing::info!(dir = %cfg.mail_dir.display(), "no pending mail");
        return Ok(());
    }

    let sched = SchedulerHandle::spawn(cfg.max_concurrent);
    sched.start();
    let cfg = Arc::new(cfg);

    let mut set = JoinSet::new();
    for file in files {
        let body = match mailbox::read_body(&cfg.mail_dir.join(&file)) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(mail = %file, error = %e, "reading message failed");
                continue;
            }
        };
        let job = Job::new(file.clone(), &body, &cfg);
        tracing::info!(mail = %file, goals = job.goals().len(), "starting job");
        let sched = sched.clone();
        let cfg = Arc::clone(&cfg);
        set.spawn(async move {
            if let Err(e) = job.run(sched, cfg).await {
                tracing::error!(mail = %file, error = %e, "job failed");
            }
        });
    }

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            tracing::error!(error = %e, "job join failed");
        }
    }
    Ok(())
}
