use anyhow::{Result, anyhow};

use crate::archive::catalog::Catalog;
use crate::archive::paths::ArchivePaths;
use crate::archive::template::{self, VersionField};
use crate::commands::CommandReport;

#[derive(Debug, Clone)]
pub struct ResolvePathOptions {
    pub template: String,
    pub file: String,
    pub version: Option<String>,
}

/// Expand `template` for a catalogued file. Returns the report and the
/// resolved path.
pub fn run(opts: &ResolvePathOptions, paths: &ArchivePaths) -> Result<(CommandReport, String)> {
    let mut report = CommandReport::new("resolve-path");
    let catalog = Catalog::load(&paths.catalog_file)?;
    let record = catalog
        .file(&opts.file)
        .ok_or_else(|| anyhow!("file `{}` is not in the catalog", opts.file))?;

    let mut ctx = record.template_context();
    if let Some(raw) = &opts.version {
        ctx.version = VersionField::Raw(raw.clone());
    }

    let resolved = template::expand(&opts.template, &ctx, Some(&catalog))?;
    report.detail(format!("template={}", opts.template));
    report.detail(format!("file={}", opts.file));
    report.count("tokens", template::tokens(&opts.template).len());
    report.detail(format!("resolved={resolved}"));
    Ok((report, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::catalog::SAMPLE_CATALOG;
    use crate::error::ArchiveError;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, ArchivePaths) {
        let tmp = tempdir().expect("tempdir");
        let paths = ArchivePaths {
            dbp_home: tmp.path().to_path_buf(),
            catalog_file: tmp.path().join("catalog.json"),
            queue_file: tmp.path().join("queue.jsonl"),
            logs_dir: tmp.path().join("logs"),
        };
        fs::write(&paths.catalog_file, SAMPLE_CATALOG).expect("write catalog");
        (tmp, paths)
    }

    #[test]
    fn resolves_catalogued_file() {
        let (_tmp, paths) = setup();
        let opts = ResolvePathOptions {
            template: "{Y}{m}{d}_{PRODUCT}_{VERSION}.dat".to_string(),
            file: "rbspa_mag_20210704_v3.2.1.cdf".to_string(),
            version: None,
        };
        let (report, resolved) = run(&opts, &paths).expect("run");
        assert_eq!(resolved, "20210704_mag_3.2.1.dat");
        assert_eq!(report.counts["tokens"], 5);
    }

    #[test]
    fn version_override_must_be_well_formed() {
        let (_tmp, paths) = setup();
        let mut opts = ResolvePathOptions {
            template: "{VERSION}".to_string(),
            file: "rbspa_mag_20210704_v3.2.1.cdf".to_string(),
            version: Some("4.0.0".to_string()),
        };
        let (_, resolved) = run(&opts, &paths).expect("run");
        assert_eq!(resolved, "4.0.0");

        opts.version = Some("4.0".to_string());
        let err = run(&opts, &paths).expect_err("malformed");
        assert_eq!(
            err.downcast_ref::<ArchiveError>(),
            Some(&ArchiveError::MalformedVersion("4.0".to_string()))
        );
    }

    #[test]
    fn unknown_file_fails() {
        let (_tmp, paths) = setup();
        let opts = ResolvePathOptions {
            template: "{Y}".to_string(),
            file: "ghost.cdf".to_string(),
            version: None,
        };
        assert!(run(&opts, &paths).is_err());
    }
}
