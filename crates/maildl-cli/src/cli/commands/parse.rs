//! `maildl parse` – dry run: show what a message file would execute.

use anyhow::Result;
use std::path::Path;

use maildl_core::config::MaildlConfig;
use maildl_core::job;
use maildl_core::mailbox;

pub fn run_parse(cfg: &MaildlConfig, file: &Path) -> Result<()> {
    let body = mailbox::read_body(file)?;
    let goals = job::content_to_goals(&body, cfg);

    for (i, goal) in goals.iter().enumerate() {
        println!("goal {} ({:?}):", i + 1, goal.kind);
        let commands = goal.commands(cfg);
        if commands.is_empty() {
            println!("  (no tasks)");
        }
        for cmd in commands {
            println!("  {cmd}");
        }
    }
    Ok(())
}
