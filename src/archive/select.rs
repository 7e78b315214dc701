use crate::archive::inspector::VersionExtractor;
use crate::archive::report::{Reporter, WarnEvent};
use crate::archive::version::Version;
use crate::error::{ArchiveError, WarningCode};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub version: Version,
}

impl Candidate {
    /// Whether `self` should win the date slot over `other`: higher version
    /// first, then the lexicographically smaller path on an exact tie.
    fn beats(&self, other: &Candidate) -> bool {
        match self.version.cmp(&other.version) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => self.path < other.path,
        }
    }
}

/// One winning candidate per calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestSet {
    by_date: BTreeMap<NaiveDate, Candidate>,
}

impl LatestSet {
    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Winners in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.by_date.values()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.iter().map(|c| c.path.clone()).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.by_date.keys().copied().collect()
    }
}

impl FromIterator<Candidate> for LatestSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Candidate> = BTreeMap::new();
        for candidate in iter {
            match by_date.entry(candidate.date) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    if candidate.beats(slot.get()) {
                        slot.insert(candidate);
                    }
                }
            }
        }
        Self { by_date }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub latest: LatestSet,
    pub skipped: Vec<ArchiveError>,
}

/// Keep the newest version of each date. Files whose date or version cannot
/// be extracted are skipped, warned about and returned in `skipped`.
pub fn cull_to_newest(
    files: &[PathBuf],
    extractor: &dyn VersionExtractor,
    reporter: &dyn Reporter,
) -> Selection {
    let mut skipped = Vec::new();
    let mut candidates = Vec::with_capacity(files.len());
    for file in files {
        match extractor.extract(file) {
            Ok((date, version)) => candidates.push(Candidate {
                path: file.clone(),
                date,
                version,
            }),
            Err(err) => {
                reporter.warn(&WarnEvent::new(
                    WarningCode::W003ExtractionSkipped,
                    "select",
                    file.display().to_string(),
                    err.to_string(),
                ));
                skipped.push(err);
            }
        }
    }
    let latest: LatestSet = candidates.into_iter().collect();
    reporter.info(
        "select",
        &format!(
            "kept {} of {} files ({} skipped)",
            latest.len(),
            files.len(),
            skipped.len()
        ),
    );
    Selection { latest, skipped }
}

/// Shell glob over a single file name. As in a shell, names starting with
/// `.` only match when the pattern itself starts with `.`.
#[derive(Debug, Clone)]
pub struct NameGlob {
    regex: Regex,
    match_hidden: bool,
}

impl NameGlob {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: glob_to_regex(pattern)?,
            match_hidden: pattern.starts_with('.'),
        })
    }

    pub fn is_match(&self, name: &str) -> bool {
        (self.match_hidden || !name.starts_with('.')) && self.regex.is_match(name)
    }
}

/// Translate a shell glob (`*`, `?`, `[...]`, `[!...]`) into an anchored
/// regex over a single path component.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    if pattern.contains('/') || pattern.contains(std::path::MAIN_SEPARATOR) {
        bail!("glob `{pattern}` must match names inside the input directory");
    }
    let mut re = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        match chars[i] {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .enumerate()
                    .skip(1)
                    .find(|(_, c)| **c == ']')
                    .map(|(offset, _)| i + 1 + offset);
                match close {
                    Some(end) => {
                        let mut body = &chars[i + 1..end];
                        re.push('[');
                        if body.first() == Some(&'!') {
                            re.push('^');
                            body = &body[1..];
                        }
                        for c in body {
                            if matches!(c, '\\' | '[' | '&' | '~' | '^') {
                                re.push('\\');
                            }
                            re.push(*c);
                        }
                        re.push(']');
                        i = end;
                    }
                    None => re.push_str(r"\["),
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }
    re.push('$');
    Regex::new(&re).with_context(|| format!("invalid glob `{pattern}`"))
}

/// Regular files directly inside `indir` whose names match `pattern`,
/// sorted by path.
pub fn collect_candidates(indir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = NameGlob::new(pattern)?;
    let read_dir =
        fs::read_dir(indir).with_context(|| format!("failed to read {}", indir.display()))?;

    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if matcher.is_match(&name.to_string_lossy()) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
