use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Header values applied to a record that carries no `#` line (or carries one
/// that omits these keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultHeader {
    /// Goal type selected when a record does not set one.
    #[serde(rename = "type")]
    pub goal_type: String,
    /// Output subdirectory (under `default_output_dir`) used when a record
    /// does not set one.
    pub dir: String,
}

impl Default for DefaultHeader {
    fn default() -> Self {
        Self {
            goal_type: "download".to_string(),
            dir: "output".to_string(),
        }
    }
}

/// External downloader command names. The core never interprets these beyond
/// splicing them into the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commands {
    /// Site-aware downloader for allow-listed video/media hosts.
    pub you_get: String,
    /// General-purpose resuming fetcher (invoked with `-c`).
    pub wget: String,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            you_get: "you-get".to_string(),
            wget: "wget".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/maildl/config.toml`.
/// All values are static at startup; there is no runtime reconfiguration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaildlConfig {
    /// Directory polled for newly arrived message files.
    pub mail_dir: PathBuf,
    /// Directory a message is moved to once all of its goals complete.
    pub mail_done_dir: PathBuf,
    /// Root under which per-record `dir` output directories are created.
    pub default_output_dir: PathBuf,
    /// Maximum number of downloader processes running at once, across all jobs.
    pub max_concurrent: usize,
    /// Seconds between pending-directory polls.
    pub poll_interval_secs: u64,
    /// Working directory for tasks whose record sets no `dir`.
    pub default_cwd: PathBuf,
    /// Header defaults merged under every record's own header line.
    #[serde(default)]
    pub default_header: DefaultHeader,
    /// Downloader binary names.
    #[serde(default)]
    pub commands: Commands,
}

impl Default for MaildlConfig {
    fn default() -> Self {
        Self {
            mail_dir: PathBuf::from("mail/Pending/cur"),
            mail_done_dir: PathBuf::from("mail/Ended/cur"),
            default_output_dir: PathBuf::from("output"),
            max_concurrent: 2,
            poll_interval_secs: 3,
            default_cwd: PathBuf::from("."),
            default_header: DefaultHeader::default(),
            commands: Commands::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("maildl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MaildlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MaildlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MaildlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
