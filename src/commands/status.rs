use anyhow::Result;
use std::env;

use crate::archive::catalog::Catalog;
use crate::archive::config::{DbpConfig, resolve_config_path};
use crate::archive::paths::ArchivePaths;
use crate::commands::CommandReport;

include!(concat!(env!("OUT_DIR"), "/dbp_env_allowlist.rs"));

/// Recognized `DBP_*` variables that are currently set.
pub fn active_env_overrides() -> Vec<&'static str> {
    GENERATED_DBP_ENV_ALLOWLIST
        .iter()
        .copied()
        .filter(|key| env::var_os(key).is_some())
        .collect()
}

pub fn run(cfg: &DbpConfig, paths: &ArchivePaths) -> Result<CommandReport> {
    let mut report = CommandReport::new("status");

    report.detail(format!("build={}", env!("BUILD_ID")));
    report.detail(format!("dbp_home={}", paths.dbp_home.display()));
    report.detail(format!("catalog_file={}", paths.catalog_file.display()));
    report.detail(format!("queue_file={}", paths.queue_file.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    if let Some(config_path) = resolve_config_path() {
        report.detail(format!("config_file={}", config_path.display()));
    }
    report.detail(format!("latest.glob={}", cfg.latest.glob));
    report.detail(format!("latest.outdir_name={}", cfg.latest.outdir_name));
    report.detail(format!("latest.force={}", cfg.latest.force));
    report.detail(format!("latest.delete={}", cfg.latest.delete));
    report.detail(format!("latest.relative_links={}", cfg.latest.relative_links));
    report.detail(format!("reprocess.newest_only={}", cfg.reprocess.newest_only));
    report.detail(format!("env_overrides={}", active_env_overrides().join(",")));

    if !paths.catalog_file.exists() {
        report.issue(format!(
            "missing catalog ({}); set DBP_CATALOG_FILE",
            paths.catalog_file.display()
        ));
        return Ok(report);
    }
    match Catalog::load(&paths.catalog_file) {
        Ok(catalog) => report.count("catalog_files", catalog.file_count()),
        Err(err) => report.issue(format!("{err:#}")),
    }

    Ok(report)
}
