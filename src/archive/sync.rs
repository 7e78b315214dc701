//! Materializes a latest-version selection as same-named symlinks in a
//! stable directory.
//!
//! Runs are not atomic and assume a single active synchronizer per target
//! directory.

use crate::archive::paths::resolve_real;
use crate::archive::report::{Reporter, WarnEvent};
use crate::error::WarningCode;
use serde::Serialize;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Replace an existing symlink of the same name that points elsewhere.
    pub force: bool,
    /// Remove every symlink in the target directory before linking.
    pub clean: bool,
    /// Write link targets relative to the target directory.
    pub relative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Created,
    Unchanged,
    Replaced,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LinkWarning {
    pub code: &'static str,
    pub file: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutcome {
    pub created: usize,
    pub unchanged: usize,
    pub replaced: usize,
    pub removed: usize,
    pub warnings: Vec<LinkWarning>,
}

impl SyncOutcome {
    fn count_of(&self, code: WarningCode) -> usize {
        self.warnings
            .iter()
            .filter(|w| w.code == code.as_str())
            .count()
    }

    pub fn conflicts(&self) -> usize {
        self.count_of(WarningCode::W001LinkConflict)
    }

    pub fn failures(&self) -> usize {
        self.count_of(WarningCode::W002LinkFailure) + self.count_of(WarningCode::W004CleanFailure)
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn record(&mut self, reporter: &dyn Reporter, code: WarningCode, file: &Path, reason: String) {
        reporter.warn(&WarnEvent::new(
            code,
            "sync",
            file.display().to_string(),
            reason.clone(),
        ));
        self.warnings.push(LinkWarning {
            code: code.as_str(),
            file: file.to_path_buf(),
            reason,
        });
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Path of `target` as seen from inside `base`. Both must be absolute for
/// the result to be meaningful.
pub fn relative_to(target: &Path, base: &Path) -> PathBuf {
    let target_parts: Vec<Component<'_>> = target.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_parts.len() {
        out.push("..");
    }
    for part in &target_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

/// Relative targets are computed between resolved directories; the file's
/// own name is kept so a symlinked source is linked as itself.
fn link_target(file: &Path, outdir: &Path, opts: &SyncOptions) -> PathBuf {
    if !opts.relative {
        return file.to_path_buf();
    }
    let (Some(parent), Some(name)) = (file.parent(), file.file_name()) else {
        return file.to_path_buf();
    };
    relative_to(&resolve_real(parent).join(name), &resolve_real(outdir))
}

/// Remove every symlink directly inside `outdir`. Regular files and
/// directories are left alone.
fn clean_links(outdir: &Path, outcome: &mut SyncOutcome, reporter: &dyn Reporter) {
    let read_dir = match fs::read_dir(outdir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            outcome.record(
                reporter,
                WarningCode::W004CleanFailure,
                outdir,
                format!("failed to read target directory: {err}"),
            );
            return;
        }
    };
    for entry in read_dir {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                outcome.record(
                    reporter,
                    WarningCode::W004CleanFailure,
                    outdir,
                    format!("failed to list entry: {err}"),
                );
                continue;
            }
        };
        if !is_symlink(&path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => outcome.removed += 1,
            Err(err) => outcome.record(
                reporter,
                WarningCode::W004CleanFailure,
                &path,
                format!("failed to remove link: {err}"),
            ),
        }
    }
}

fn link_one(
    file: &Path,
    outdir: &Path,
    opts: &SyncOptions,
) -> Result<LinkAction, (WarningCode, String)> {
    let Some(name) = file.file_name() else {
        return Err((
            WarningCode::W002LinkFailure,
            "source has no file name".to_string(),
        ));
    };
    let link = outdir.join(name);
    let target = link_target(file, outdir, opts);

    let err = match create_symlink(&target, &link) {
        Ok(()) => return Ok(LinkAction::Created),
        Err(err) => err,
    };
    if err.kind() != ErrorKind::AlreadyExists {
        return Err((
            WarningCode::W002LinkFailure,
            format!("failed to link {}: {err}", link.display()),
        ));
    }

    if !is_symlink(&link) {
        return Err((
            WarningCode::W001LinkConflict,
            format!("{} exists and is not a symlink", link.display()),
        ));
    }
    if fs::read_link(&link).is_ok_and(|existing| existing == target) {
        return Ok(LinkAction::Unchanged);
    }
    if !opts.force {
        return Err((
            WarningCode::W001LinkConflict,
            format!("{} already links elsewhere", link.display()),
        ));
    }

    fs::remove_file(&link).map_err(|err| {
        (
            WarningCode::W002LinkFailure,
            format!("failed to remove {}: {err}", link.display()),
        )
    })?;
    create_symlink(&target, &link).map_err(|err| {
        (
            WarningCode::W002LinkFailure,
            format!("failed to relink {}: {err}", link.display()),
        )
    })?;
    Ok(LinkAction::Replaced)
}

/// Link every file in `selected` into `outdir` under its own base name.
/// Per-file problems are recorded in the outcome and never stop the batch.
pub fn sync_links(
    selected: &[PathBuf],
    outdir: &Path,
    opts: &SyncOptions,
    reporter: &dyn Reporter,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();
    if opts.clean {
        clean_links(outdir, &mut outcome, reporter);
    }

    for file in selected {
        match link_one(file, outdir, opts) {
            Ok(LinkAction::Created) => outcome.created += 1,
            Ok(LinkAction::Unchanged) => outcome.unchanged += 1,
            Ok(LinkAction::Replaced) => outcome.replaced += 1,
            Err((code, reason)) => outcome.record(reporter, code, file, reason),
        }
    }

    reporter.info(
        "sync",
        &format!(
            "created={} unchanged={} replaced={} removed={} warnings={}",
            outcome.created,
            outcome.unchanged,
            outcome.replaced,
            outcome.removed,
            outcome.warnings.len()
        ),
    );
    outcome
}
