//! Append-only run history at `<logs_dir>/audit.log`, one JSON object per
//! line.

use crate::archive::util::now_epoch_secs;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub command: String,
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub counts: BTreeMap<String, usize>,
}

impl AuditEvent {
    pub fn new(command: &str, ok: bool, message: impl Into<String>) -> Result<Self> {
        Ok(Self {
            at_epoch_secs: now_epoch_secs()?,
            command: command.to_string(),
            ok,
            message: message.into(),
            counts: BTreeMap::new(),
        })
    }

    pub fn with_counts(mut self, counts: &BTreeMap<String, usize>) -> Self {
        self.counts = counts.clone();
        self
    }
}

pub fn audit_log_path(logs_dir: &Path) -> PathBuf {
    logs_dir.join("audit.log")
}

/// Append `event` under an exclusive lock so concurrent runs never
/// interleave partial lines.
pub fn append(logs_dir: &Path, event: &AuditEvent) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let path = audit_log_path(logs_dir);
    let mut line = serde_json::to_string(event)?;
    line.push('\n');

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", path.display()))?;
    let written = file.write_all(line.as_bytes());
    let unlocked = FileExt::unlock(&file);
    written.with_context(|| format!("failed to write {}", path.display()))?;
    unlocked.with_context(|| format!("failed to unlock {}", path.display()))?;
    Ok(())
}
