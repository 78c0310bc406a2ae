mod once;
mod parse;
mod run;

pub use once::run_once;
pub use parse::run_parse;
pub use run::run_daemon;
