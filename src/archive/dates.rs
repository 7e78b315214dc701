use anyhow::{Context, Result};
use chrono::NaiveDate;

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date `{input}`: expected YYYY-MM-DD"))
}

/// Every calendar day from `start` to `stop`, both inclusive.
pub fn expand_dates(start: NaiveDate, stop: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= stop).collect()
}

/// Days between the first and last entry of `present` (sorted) that are
/// not in `present`.
pub fn missing_dates(present: &[NaiveDate]) -> Vec<NaiveDate> {
    let (Some(first), Some(last)) = (present.first(), present.last()) else {
        return Vec::new();
    };
    expand_dates(*first, *last)
        .into_iter()
        .filter(|d| present.binary_search(d).is_err())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    pub fn describe(&self) -> String {
        let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "*".into());
        format!("{}..{}", show(self.start), show(self.end))
    }
}
