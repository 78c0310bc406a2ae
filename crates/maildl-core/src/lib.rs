pub mod config;
pub mod logging;

pub mod classify;
pub mod goal;
pub mod job;
pub mod mailbox;
pub mod monitor;
pub mod parser;
pub mod scheduler;
pub mod task;
