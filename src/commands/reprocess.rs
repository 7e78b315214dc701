use anyhow::{Result, bail};
use std::collections::BTreeSet;

use crate::archive::audit::{self, AuditEvent};
use crate::archive::catalog::Catalog;
use crate::archive::config::DbpConfig;
use crate::archive::dates::DateRange;
use crate::archive::paths::ArchivePaths;
use crate::archive::queue;
use crate::archive::version::VersionComponent;
use crate::commands::CommandReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReprocessTarget {
    Code(String),
    Product(String),
}

impl ReprocessTarget {
    fn kind(&self) -> &'static str {
        match self {
            Self::Code(_) => "code",
            Self::Product(_) => "product",
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Code(name) | Self::Product(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReprocessOptions {
    pub target: ReprocessTarget,
    pub range: DateRange,
    pub bump: Option<VersionComponent>,
}

fn products_for<'a>(
    catalog: &'a Catalog,
    target: &'a ReprocessTarget,
) -> Result<BTreeSet<&'a str>> {
    match target {
        ReprocessTarget::Product(name) => {
            if catalog.product(name).is_none() {
                bail!("unknown product `{name}`");
            }
            Ok(BTreeSet::from([name.as_str()]))
        }
        ReprocessTarget::Code(name) => {
            let Some(code) = catalog.code(name) else {
                bail!("unknown code `{name}`");
            };
            Ok(code.input_products.iter().map(String::as_str).collect())
        }
    }
}

pub fn run(
    opts: &ReprocessOptions,
    cfg: &DbpConfig,
    paths: &ArchivePaths,
) -> Result<CommandReport> {
    let command = format!("reprocess-by-{}", opts.target.kind());
    let mut report = CommandReport::new(command.clone());

    let catalog = Catalog::load(&paths.catalog_file)?;
    let products = products_for(&catalog, &opts.target)?;
    let files = catalog.files_for_products(&products, &opts.range, cfg.reprocess.newest_only);

    report.detail(format!("catalog={}", paths.catalog_file.display()));
    report.detail(format!("queue={}", paths.queue_file.display()));
    report.detail(format!(
        "products={}",
        products.iter().copied().collect::<Vec<_>>().join(",")
    ));
    report.detail(format!("dates={}", opts.range.describe()));
    if let Some(bump) = opts.bump {
        report.detail(format!("bump={bump:?}").to_lowercase());
    }

    let added = queue::enqueue(&paths.queue_file, &files, opts.bump)?;
    report.count("enqueued", added);

    let message = format!(
        "Added {added} files to be reprocessed for {} {}",
        opts.target.kind(),
        opts.target.name()
    );
    report.detail(message.clone());
    let event = AuditEvent::new(&command, true, message)?.with_counts(&report.counts);
    audit::append(&paths.logs_dir, &event)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::catalog::SAMPLE_CATALOG;
    use crate::archive::queue::QueueEntry;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, ArchivePaths) {
        let tmp = tempdir().expect("tempdir");
        let paths = ArchivePaths {
            dbp_home: tmp.path().to_path_buf(),
            catalog_file: tmp.path().join("catalog.json"),
            queue_file: tmp.path().join("queue").join("process_queue.jsonl"),
            logs_dir: tmp.path().join("logs"),
        };
        fs::write(&paths.catalog_file, SAMPLE_CATALOG).expect("write catalog");
        (tmp, paths)
    }

    fn queued(paths: &ArchivePaths) -> Vec<QueueEntry> {
        fs::read_to_string(&paths.queue_file)
            .expect("read queue")
            .lines()
            .map(|l| serde_json::from_str(l).expect("entry"))
            .collect()
    }

    #[test]
    fn by_code_enqueues_newest_inputs() {
        let (_tmp, paths) = setup();
        let opts = ReprocessOptions {
            target: ReprocessTarget::Code("l2_mag".to_string()),
            range: DateRange::default(),
            bump: Some(VersionComponent::Revision),
        };
        let report = run(&opts, &DbpConfig::default(), &paths).expect("run");

        assert_eq!(report.command, "reprocess-by-code");
        assert_eq!(report.counts["enqueued"], 2);
        assert!(
            report
                .details
                .contains(&"Added 2 files to be reprocessed for code l2_mag".to_string())
        );
        let entries = queued(&paths);
        assert_eq!(entries[1].filename, "rbspa_mag_l1_20210704_v1.1.0.cdf");
        assert_eq!(
            entries[1].target_version.map(|v| v.to_string()),
            Some("1.1.1".to_string())
        );
    }

    #[test]
    fn by_product_honours_date_range() {
        let (_tmp, paths) = setup();
        let day = NaiveDate::from_ymd_opt(2021, 7, 3).expect("date");
        let opts = ReprocessOptions {
            target: ReprocessTarget::Product("mag_l1".to_string()),
            range: DateRange {
                start: Some(day),
                end: Some(day),
            },
            bump: None,
        };
        let report = run(&opts, &DbpConfig::default(), &paths).expect("run");
        assert_eq!(report.counts["enqueued"], 1);
        assert_eq!(queued(&paths)[0].filename, "rbspa_mag_l1_20210703_v1.0.0.cdf");
    }

    #[test]
    fn all_versions_when_newest_only_disabled() {
        let (_tmp, paths) = setup();
        let mut cfg = DbpConfig::default();
        cfg.reprocess.newest_only = false;
        let opts = ReprocessOptions {
            target: ReprocessTarget::Product("mag_l1".to_string()),
            range: DateRange::default(),
            bump: None,
        };
        let report = run(&opts, &cfg, &paths).expect("run");
        assert_eq!(report.counts["enqueued"], 3);
    }

    #[test]
    fn unknown_targets_fail() {
        let (_tmp, paths) = setup();
        for target in [
            ReprocessTarget::Code("ghost".to_string()),
            ReprocessTarget::Product("ghost".to_string()),
        ] {
            let opts = ReprocessOptions {
                target,
                range: DateRange::default(),
                bump: None,
            };
            assert!(run(&opts, &DbpConfig::default(), &paths).is_err());
        }
    }
}
