//! CLI for the maildl download executor.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use maildl_core::config;
use std::path::PathBuf;

use commands::{run_daemon, run_once, run_parse};

/// Top-level CLI for the maildl mail-driven download executor.
#[derive(Debug, Parser)]
#[command(name = "maildl")]
#[command(about = "maildl: mail-driven download executor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Watch the pending mail directory and execute downloads as messages arrive.
    Run {
        /// Override the configured poll interval, in seconds.
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,
    },

    /// Process the current pending backlog to completion, then exit.
    Once,

    /// Print the goals and command lines a message file would produce, without executing anything.
    Parse {
        /// Path to the message file.
        file: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;

        match cli.command {
            CliCommand::Run { poll_interval } => {
                if let Some(secs) = poll_interval {
                    cfg.poll_interval_secs = secs;
                }
                run_daemon(cfg).await
            }
            CliCommand::Once => run_once(cfg).await,
            CliCommand::Parse { file } => run_parse(&cfg, &file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_poll_interval() {
        let cli = Cli::parse_from(["maildl", "run", "--poll-interval", "10"]);
        match cli.command {
            CliCommand::Run { poll_interval } => assert_eq!(poll_interval, Some(10)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_once() {
        let cli = Cli::parse_from(["maildl", "once"]);
        assert!(matches!(cli.command, CliCommand::Once));
    }

    #[test]
    fn parses_parse_with_file() {
        let cli = Cli::parse_from(["maildl", "parse", "/tmp/msg"]);
        match cli.command {
            CliCommand::Parse { file } => assert_eq!(file, PathBuf::from("/tmp/msg")),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
