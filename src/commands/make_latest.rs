use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::audit::{self, AuditEvent};
use crate::archive::config::DbpConfig;
use crate::archive::dates::missing_dates;
use crate::archive::inspector::FilenameInspector;
use crate::archive::paths::{ArchivePaths, expand_user, resolve_real};
use crate::archive::report::Reporter;
use crate::archive::select::{collect_candidates, cull_to_newest};
use crate::archive::sync::{SyncOptions, sync_links};
use crate::commands::CommandReport;

#[derive(Debug, Clone, Default)]
pub struct MakeLatestOptions {
    pub indir: PathBuf,
    pub glob: Option<String>,
    pub outdir: Option<PathBuf>,
    pub delete: bool,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestDirs {
    pub indir: PathBuf,
    pub outdir: PathBuf,
}

impl LatestDirs {
    pub fn clobbers_input(&self) -> bool {
        self.indir == self.outdir
    }
}

fn absolute(raw: &Path) -> Result<PathBuf> {
    let expanded = expand_user(raw);
    let absolute = std::path::absolute(&expanded)
        .with_context(|| format!("failed to resolve {}", expanded.display()))?;
    Ok(resolve_real(&absolute))
}

/// Input and output directories with `..` and symlinks resolved, so two
/// spellings of one directory compare equal. The output defaults to
/// `<indir>/<outdir_name>`.
pub fn resolve_dirs(opts: &MakeLatestOptions, cfg: &DbpConfig) -> Result<LatestDirs> {
    let indir = absolute(&opts.indir)?;
    let outdir = match &opts.outdir {
        Some(outdir) => absolute(outdir)?,
        None => indir.join(&cfg.latest.outdir_name),
    };
    Ok(LatestDirs { indir, outdir })
}

pub fn run(
    dirs: &LatestDirs,
    opts: &MakeLatestOptions,
    cfg: &DbpConfig,
    paths: &ArchivePaths,
    reporter: &dyn Reporter,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("make-latest");
    let glob = opts.glob.as_deref().unwrap_or(&cfg.latest.glob);

    report.detail(format!("indir={}", dirs.indir.display()));
    report.detail(format!("outdir={}", dirs.outdir.display()));
    report.detail(format!("glob={glob}"));

    if !dirs.indir.is_dir() {
        report.issue(format!("input directory not found: {}", dirs.indir.display()));
        return Ok(report);
    }
    fs::create_dir_all(&dirs.outdir)
        .with_context(|| format!("failed to create {}", dirs.outdir.display()))?;

    let files = collect_candidates(&dirs.indir, glob)?;
    let selection = cull_to_newest(&files, &FilenameInspector, reporter);
    let gaps = missing_dates(&selection.latest.dates());

    let sync_opts = SyncOptions {
        force: opts.force || cfg.latest.force,
        clean: opts.delete || cfg.latest.delete,
        relative: cfg.latest.relative_links,
    };
    let outcome = sync_links(&selection.latest.paths(), &dirs.outdir, &sync_opts, reporter);

    report.count("candidates", files.len());
    report.count("selected", selection.latest.len());
    report.count("skipped", selection.skipped.len());
    report.count("created", outcome.created);
    report.count("unchanged", outcome.unchanged);
    report.count("replaced", outcome.replaced);
    report.count("removed", outcome.removed);
    report.count("conflicts", outcome.conflicts());
    report.count("failures", outcome.failures());
    report.count("date_gaps", gaps.len());

    if selection.latest.is_empty() {
        report.detail("no dated files matched");
    }
    for err in &selection.skipped {
        report.detail(format!("skipped: {err}"));
    }
    if !gaps.is_empty() {
        let listed = gaps.iter().map(|d| d.to_string()).collect::<Vec<_>>();
        report.detail(format!("missing dates: {}", listed.join(",")));
    }
    for warning in &outcome.warnings {
        report.issue(format!(
            "{} {}: {}",
            warning.code,
            warning.file.display(),
            warning.reason
        ));
    }

    let summary = format!("{} -> {}", dirs.indir.display(), dirs.outdir.display());
    let event = AuditEvent::new("make-latest", outcome.is_clean(), summary)?
        .with_counts(&report.counts);
    audit::append(&paths.logs_dir, &event)?;

    Ok(report)
}
