//! End-to-end pipeline test: a message file in a tempdir maildir is parsed
//! into goals, its commands run through the scheduler (downloaders stubbed
//! with `echo` into a log file), and the message lands in the done directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use maildl_core::config::MaildlConfig;
use maildl_core::job::Job;
use maildl_core::scheduler::SchedulerHandle;
use tempfile::tempdir;

fn test_config(root: &Path) -> MaildlConfig {
    let mut cfg = MaildlConfig::default();
    cfg.mail_dir = root.join("pending");
    cfg.mail_done_dir = root.join("done");
    cfg.default_output_dir = root.join("output");
    cfg.default_cwd = root.to_path_buf();
    fs::create_dir_all(&cfg.mail_dir).unwrap();
    fs::create_dir_all(&cfg.mail_done_dir).unwrap();
    cfg
}

/// Downloader stub: prepends an `echo ... >> log` so each "download" records
/// its own command tail (tool tag + URL) into the log file.
fn stub(tag: &str, log: &Path) -> String {
    format!("echo {tag} >>{}", log.display())
}

#[tokio::test]
async fn message_runs_downloads_and_moves_to_done() {
    let root = tempdir().unwrap();
    let log = root.path().join("invocations.log");
    let mut cfg = test_config(root.path());
    cfg.commands.you_get = stub("you-get", &log);
    cfg.commands.wget = stub("wget", &log);

    let body = "\
From: someone@example.com\n\
Subject: downloads\n\
\n\
av1234 5678\n\
\n\
#type: you-get, dir: vids\n\
http://example.com/x\n";
    fs::write(cfg.mail_dir.join("msg-1"), body).unwrap();

    let sched = SchedulerHandle::spawn(cfg.max_concurrent);
    sched.start();

    let text = maildl_core::mailbox::read_body(&cfg.mail_dir.join("msg-1")).unwrap();
    let job = Job::new("msg-1", &text, &cfg);
    assert_eq!(job.goals().len(), 2);

    let cfg = Arc::new(cfg);
    job.run(sched, Arc::clone(&cfg)).await.unwrap();

    // Message moved pending -> done.
    assert!(!cfg.mail_dir.join("msg-1").exists());
    assert!(cfg.mail_done_dir.join("msg-1").exists());

    // Every task invoked its downloader exactly once.
    let mut lines: Vec<String> = fs::read_to_string(&log)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "you-get http://example.com/x",
            "you-get https://www.bilibili.com/video/av1234",
            "you-get https://www.bilibili.com/video/av5678",
        ]
    );

    // Output directories from the headers exist.
    assert!(cfg.default_output_dir.join("output").is_dir());
    assert!(cfg.default_output_dir.join("vids").is_dir());
}

#[tokio::test]
async fn failing_output_dir_does_not_block_finalization() {
    let root = tempdir().unwrap();
    let mut cfg = test_config(root.path());
    // A file where the output root should be: every dir creation fails.
    fs::remove_dir_all(&cfg.default_output_dir).ok();
    fs::write(&cfg.default_output_dir, b"in the way").unwrap();

    fs::write(cfg.mail_dir.join("msg-2"), "#type: you-get, dir: sub\nhttp://x\n").unwrap();

    let sched = SchedulerHandle::spawn(1);
    sched.start();

    let text = maildl_core::mailbox::read_body(&cfg.mail_dir.join("msg-2")).unwrap();
    let job = Job::new("msg-2", &text, &cfg);
    let cfg = Arc::new(cfg);
    job.run(sched, Arc::clone(&cfg)).await.unwrap();

    // The goal failed (logged), but the mail is still finalized.
    assert!(cfg.mail_done_dir.join("msg-2").exists());
}

#[tokio::test]
async fn failed_download_still_finalizes_the_message() {
    let root = tempdir().unwrap();
    let mut cfg = test_config(root.path());
    cfg.commands.you_get = "false".to_string();
    cfg.commands.wget = "false".to_string();

    fs::write(cfg.mail_dir.join("msg-3"), "http://random.nowhere/x\n").unwrap();

    let sched = SchedulerHandle::spawn(2);
    sched.start();

    let text = maildl_core::mailbox::read_body(&cfg.mail_dir.join("msg-3")).unwrap();
    let job = Job::new("msg-3", &text, &cfg);
    let cfg = Arc::new(cfg);
    job.run(sched, Arc::clone(&cfg)).await.unwrap();

    assert!(cfg.mail_done_dir.join("msg-3").exists());
}
