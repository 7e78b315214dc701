use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CATALOG: &str = r#"{
  "products": [
    {"name": "mag_l1", "instrument": "emfisis", "satellite": "rbspa", "mission": "rbsp"},
    {"name": "mag", "instrument": "emfisis", "satellite": "rbspa", "mission": "rbsp"}
  ],
  "codes": [
    {"name": "l2_mag", "input_products": ["mag_l1"], "output_product": "mag"}
  ],
  "files": [
    {"filename": "rbspa_mag_l1_20121002_v1.0.0.cdf", "product": "mag_l1", "utc_file_date": "2012-10-02", "version": "1.0.0"},
    {"filename": "rbspa_mag_l1_20121002_v1.0.1.cdf", "product": "mag_l1", "utc_file_date": "2012-10-02", "version": "1.0.1"},
    {"filename": "rbspa_mag_l1_20121026_v1.0.0.cdf", "product": "mag_l1", "utc_file_date": "2012-10-26", "version": "1.0.0"},
    {"filename": "rbspa_mag_20121002_v2.0.0.cdf", "product": "mag", "utc_file_date": "2012-10-02", "version": "2.0.0"}
  ]
}"#;

fn dbp(root: &Path) -> assert_cmd::Command {
    let home = root.join("home");
    fs::create_dir_all(&home).expect("mkdir home");
    fs::write(home.join("catalog.json"), CATALOG).expect("write catalog");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("dbp");
    cmd.current_dir(root)
        .env("DBP_HOME", &home)
        .env("DBP_CONFIG_PATH", home.join("dbp.toml"))
        .env_remove("DBP_CATALOG_FILE")
        .env_remove("DBP_QUEUE_FILE")
        .env_remove("DBP_REPROCESS_NEWEST_ONLY");
    cmd
}

fn queue_lines(root: &Path) -> Vec<serde_json::Value> {
    let raw = fs::read_to_string(root.join("home/queue/process_queue.jsonl")).expect("read queue");
    raw.lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect()
}

#[test]
fn reprocess_by_code_queues_inputs_in_range() {
    let tmp = tempdir().expect("tempdir");

    dbp(tmp.path())
        .args([
            "reprocess-by-code",
            "l2_mag",
            "--startDate",
            "2012-10-02",
            "--endDate",
            "2012-10-25",
            "--force",
            "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Added 1 files to be reprocessed for code l2_mag",
        ));

    let lines = queue_lines(tmp.path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["filename"], "rbspa_mag_l1_20121002_v1.0.1.cdf");
    assert_eq!(lines[0]["target_version"], "1.0.2");

    let audit = fs::read_to_string(tmp.path().join("home/logs/audit.log")).expect("audit");
    assert!(audit.contains("Added 1 files to be reprocessed for code l2_mag"));
}

#[test]
fn reprocess_by_product_without_range_queues_every_date() {
    let tmp = tempdir().expect("tempdir");

    dbp(tmp.path())
        .args(["--json", "reprocess-by-product", "mag_l1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"enqueued\": 2"));

    let lines = queue_lines(tmp.path());
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l["bump"].is_null()));
}

#[test]
fn reprocess_rejects_unknown_names_and_bad_flags() {
    let tmp = tempdir().expect("tempdir");

    dbp(tmp.path())
        .args(["reprocess-by-product", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown product `ghost`"));

    dbp(tmp.path())
        .args(["reprocess-by-code", "l2_mag", "--force", "5"])
        .assert()
        .code(2);

    dbp(tmp.path())
        .args(["reprocess-by-code", "l2_mag", "--startDate", "2012-13-01"])
        .assert()
        .code(2);
}
