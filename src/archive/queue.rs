use crate::archive::catalog::FileRecord;
use crate::archive::util::now_epoch_secs;
use crate::archive::version::{Version, VersionComponent};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// One line of the process queue: a file waiting to be reprocessed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueEntry {
    pub filename: String,
    pub product: String,
    pub utc_file_date: NaiveDate,
    pub version: Version,
    pub bump: Option<VersionComponent>,
    pub target_version: Option<Version>,
    pub enqueued_at_epoch_secs: u64,
}

impl QueueEntry {
    pub fn for_file(
        file: &FileRecord,
        bump: Option<VersionComponent>,
        enqueued_at_epoch_secs: u64,
    ) -> Self {
        Self {
            filename: file.filename.clone(),
            product: file.product.clone(),
            utc_file_date: file.utc_file_date,
            version: file.version,
            bump,
            target_version: bump.map(|component| file.version.bump(component)),
            enqueued_at_epoch_secs,
        }
    }
}

/// Append every file to the queue under an exclusive lock. Returns the
/// number of entries written.
pub fn enqueue(
    queue_file: &Path,
    files: &[&FileRecord],
    bump: Option<VersionComponent>,
) -> Result<usize> {
    if let Some(parent) = queue_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let now = now_epoch_secs()?;

    let mut buf = String::new();
    for file in files {
        let entry = QueueEntry::for_file(file, bump, now);
        buf.push_str(&serde_json::to_string(&entry)?);
        buf.push('\n');
    }

    let mut handle = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(queue_file)
        .with_context(|| format!("failed to open {}", queue_file.display()))?;
    handle
        .lock_exclusive()
        .with_context(|| format!("failed to lock {}", queue_file.display()))?;
    let written = handle.write_all(buf.as_bytes());
    let unlocked = FileExt::unlock(&handle);
    written.with_context(|| format!("failed to write {}", queue_file.display()))?;
    unlocked.with_context(|| format!("failed to unlock {}", queue_file.display()))?;
    Ok(files.len())
}
