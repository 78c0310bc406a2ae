//! Message-file boundary: listing the pending directory, pulling a plain-text
//! body out of a message file, and the pending→done move.
//!
//! Full MIME decoding stays outside the core; `extract_text` only strips an
//! RFC822-style header block so plain-text messages delivered into a maildir
//! work out of the box.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::MaildlConfig;

/// Names of regular files in `dir`, non-recursive. Entries that vanish or
/// fail to stat mid-listing are skipped.
pub fn list_messages(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            if let Ok(name) = entry.file_name().into_string() {
                files.push(name);
            }
        }
    }
    Ok(files)
}

/// Plain-text body of a raw message: when the first line looks like a
/// `Name: value` header, everything through the first blank line is dropped;
/// otherwise the content is returned untouched. Headers with no body yield
/// an empty string.
pub fn extract_text(raw: &str) -> &str {
    let first_line = raw.lines().next().unwrap_or("");
    let has_header_block = first_line
        .split_once(':')
        .map(|(name, value)| {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                // A scheme separator, not a header ("http://...").
                && !value.starts_with("//")
        })
        .unwrap_or(false);
    if !has_header_block {
        return raw;
    }

    let crlf = raw.find("\r\n\r\n").map(|i| i + 4);
    let lf = raw.find("\n\n").map(|i| i + 2);
    let body_start = match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    match body_start {
        Some(start) => &raw[start..],
        None => "",
    }
}

/// Read a message file and extract its body text.
pub fn read_body(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(extract_text(&raw).to_string())
}

/// Move a finished message from the pending to the done directory.
pub fn mark_done(cfg: &MaildlConfig, mail_id: &str) -> Result<()> {
    let from = cfg.mail_dir.join(mail_id);
    let to = cfg.mail_done_dir.join(mail_id);
    fs::rename(&from, &to)
        .with_context(|| format!("moving {} to {}", from.display(), to.display()))
}
