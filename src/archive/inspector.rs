use crate::archive::version::Version;
use crate::error::ArchiveError;
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// Digit runs are matched greedily so a date never starts or ends inside a
// longer number; widths are checked on the captures.
static DASHED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)-(\d+)-(\d+)").expect("dashed date pattern compiles")
});
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run pattern compiles"));
static FILE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v(\d+\.\d+\.\d+)").expect("version pattern compiles")
});

/// Pulls the calendar date and version out of an archived file's name
/// without consulting the catalog.
pub trait VersionExtractor {
    fn extract(&self, file: &Path) -> Result<(NaiveDate, Version), ArchiveError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameInspector;

fn file_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn ymd_from_parts(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    if y.len() != 4 || m.len() != 2 || d.len() != 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn dashed_date(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
    ymd_from_parts(caps.get(1)?.as_str(), caps.get(2)?.as_str(), caps.get(3)?.as_str())
}

fn compact_date(run: &str) -> Option<NaiveDate> {
    if run.len() != 8 {
        return None;
    }
    ymd_from_parts(&run[..4], &run[4..6], &run[6..])
}

/// First valid `YYYY-MM-DD`, else first valid standalone `YYYYMMDD`.
pub fn extract_date(name: &str) -> Option<NaiveDate> {
    DASHED_DATE
        .captures_iter(name)
        .find_map(|caps| dashed_date(&caps))
        .or_else(|| {
            DIGIT_RUN
                .find_iter(name)
                .find_map(|run| compact_date(run.as_str()))
        })
}

pub fn extract_version(name: &str) -> Option<Version> {
    FILE_VERSION
        .captures_iter(name)
        .find_map(|caps| Version::parse(caps.get(1)?.as_str()).ok())
}

impl VersionExtractor for FilenameInspector {
    fn extract(&self, file: &Path) -> Result<(NaiveDate, Version), ArchiveError> {
        let name = file_name(file);
        let date = extract_date(&name).ok_or_else(|| ArchiveError::Extraction {
            file: file.display().to_string(),
            what: "date",
        })?;
        let version = extract_version(&name).ok_or_else(|| ArchiveError::Extraction {
            file: file.display().to_string(),
            what: "version",
        })?;
        Ok((date, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[rstest]
    #[case("a.2024-01-01.v1.0.0.dat", ymd(2024, 1, 1), Version::new(1, 0, 0))]
    #[case("rbspa_mag_20120901_v1.2.3.cdf", ymd(2012, 9, 1), Version::new(1, 2, 3))]
    #[case("l2_20130229x_20130301_v10.0.12.cdf", ymd(2013, 3, 1), Version::new(10, 0, 12))]
    fn extracts_date_and_version(
        #[case] name: &str,
        #[case] date: NaiveDate,
        #[case] version: Version,
    ) {
        let got = FilenameInspector
            .extract(&PathBuf::from("/archive/2024").join(name))
            .expect("extract");
        assert_eq!(got, (date, version));
    }

    #[test]
    fn directory_components_are_ignored() {
        let err = FilenameInspector
            .extract(Path::new("/data/2024-01-01/v1.0.0/readme.txt"))
            .expect_err("no date in basename");
        assert!(matches!(err, ArchiveError::Extraction { what: "date", .. }));
    }

    #[test]
    fn missing_version_is_an_extraction_error() {
        let err = FilenameInspector
            .extract(Path::new("a.2024-01-01.dat"))
            .expect_err("no version");
        assert!(matches!(err, ArchiveError::Extraction { what: "version", .. }));
    }

    #[test]
    fn invalid_calendar_dates_are_skipped() {
        assert_eq!(extract_date("x_2024-13-01_2024-02-03"), Some(ymd(2024, 2, 3)));
        assert_eq!(extract_date("x_123456789_v1.0.0"), None);
    }

    #[rstest]
    #[case("x_20201399_20200102_v1.0.0.cdf", Some(ymd(2020, 1, 2)))]
    #[case("x_12024-01-015_v1.0.0.cdf", None)]
    #[case("x_2024-01-015_v1.0.0.cdf", None)]
    #[case("x_920240101_v1.0.0.cdf", None)]
    #[case("x-2024-01-02-extra.cdf", Some(ymd(2024, 1, 2)))]
    fn dates_need_digit_boundaries(#[case] name: &str, #[case] expected: Option<NaiveDate>) {
        assert_eq!(extract_date(name), expected);
    }
}
