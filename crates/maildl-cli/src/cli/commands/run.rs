//! `maildl run` – daemon loop: poll for new mail, run jobs, forward
//! termination signals to running downloads.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use maildl_core::config::MaildlConfig;
use maildl_core::job::Job;
use maildl_core::mailbox;
use maildl_core::monitor::Monitor;
use maildl_core::scheduler::SchedulerHandle;
use tokio::sync::{mpsc, watch};

pub async fn run_daemon(cfg: MaildlConfig) -> Result<()> {
    std::fs::create_dir_all(&cfg.mail_dir)?;
    std::fs::create_dir_all(&cfg.mail_done_dir)?;

    let sched = SchedulerHandle::spawn(cfg.max_concurrent);
    sched.start();

    let (mail_tx, mut mail_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = Monitor::new(&cfg.mail_dir);
    tokio::spawn(monitor.watch(
        Duration::from_secs(cfg.poll_interval_secs.max(1)),
        mail_tx,
        shutdown_rx,
    ));

    let cfg = Arc::new(cfg);
    tracing::info!(
        dir = %cfg.mail_dir.display(),
        max_concurrent = cfg.max_concurrent,
        "watching for mail"
    );

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        loop {
            tokio::select! {
                Some(files) = mail_rx.recv() => {
                    for file in files {
                        spawn_job(&sched, &cfg, file);
                    }
                }
                _ = sigint.recv() => {
                    tracing::info!("SIGINT: forwarding to running downloads and exiting");
                    sched.kill(libc::SIGINT);
                    break;
                }
                _ = sigterm.recv() => {
                    tracing::info!("SIGTERM: forwarding to running downloads and exiting");
                    sched.kill(libc::SIGTERM);
                    break;
                }
            }
        }
    }

    #[cfg(not(unix))]
    loop {
        tokio::select! {
            Some(files) = mail_rx.recv() => {
                for file in files {
                    spawn_job(&sched, &cfg, file);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt: exiting");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Read one message and run its job in the background; a message that cannot
/// be read is logged and skipped (it stays in the pending dir for a retry
/// after a restart).
fn spawn_job(sched: &SchedulerHandle, cfg: &Arc<MaildlConfig>, file: String) {
    let body = match mailbox::read_body(&cfg.mail_dir.join(&file)) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(mail = %file, error = %e, "reading message failed");
            return;
        }
    };

    let job = Job::new(file.clone(), &body, cfg);
    tracing::info!(mail = %file, goals = job.goals().len(), "starting job");

    let sched = sched.clone();
    let cfg = Arc::clone(cfg);
    tokio::spawn(async move {
        if let Err(e) = job.run(sched, cfg).await {
            tracing::error!(mail = %file, error = %e, "job failed");
        }
    });
}
