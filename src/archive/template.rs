//! Path and filename templating.
//!
//! A template is literal text with `{TOKEN}` markers. Recognized tokens are a
//! closed set ([`Token`]); anything else inside braces passes through
//! verbatim so callers can layer their own token systems on top.

use crate::archive::version::Version;
use crate::error::ArchiveError;
use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Year,
    ShortYear,
    Month,
    MonthAbbrev,
    Day,
    DayOfYear,
    Hour,
    Minute,
    Second,
    Version,
    Date,
    Instrument,
    Satellite,
    Mission,
    Product,
}

impl Token {
    pub fn from_name(name: &str) -> Option<Self> {
        let token = match name {
            "Y" => Self::Year,
            "y" => Self::ShortYear,
            "m" => Self::Month,
            "b" => Self::MonthAbbrev,
            "d" => Self::Day,
            "j" => Self::DayOfYear,
            "H" => Self::Hour,
            "M" => Self::Minute,
            "S" => Self::Second,
            "VERSION" => Self::Version,
            "DATE" => Self::Date,
            "INSTRUMENT" => Self::Instrument,
            "SATELLITE" | "SPACECRAFT" => Self::Satellite,
            "MISSION" => Self::Mission,
            "PRODUCT" => Self::Product,
            _ => return None,
        };
        Some(token)
    }

    pub fn is_lineage(self) -> bool {
        matches!(
            self,
            Self::Instrument | Self::Satellite | Self::Mission | Self::Product
        )
    }
}

/// Names of the mission → satellite → instrument → product chain a file
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub mission: String,
    pub satellite: String,
    pub instrument: String,
    pub product: String,
}

pub trait LineageLookup {
    /// One call returns every lineage name for `file_id`.
    fn lineage(&self, file_id: &str) -> Result<Lineage, ArchiveError>;
}

/// Version as handed to the resolver. Raw strings are parsed only when the
/// template actually contains `{VERSION}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionField {
    Parsed(Version),
    Raw(String),
}

impl VersionField {
    fn resolve(&self) -> Result<Version, ArchiveError> {
        match self {
            Self::Parsed(v) => Ok(*v),
            Self::Raw(raw) => Version::parse(raw),
        }
    }
}

impl From<Version> for VersionField {
    fn from(value: Version) -> Self {
        Self::Parsed(value)
    }
}

#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub file_id: String,
    pub file_date: NaiveDate,
    pub start_time: NaiveTime,
    pub version: VersionField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Token(Token),
}

fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        let token = after_open
            .find('}')
            .and_then(|close| Token::from_name(&after_open[..close]).map(|t| (t, close)));
        match token {
            Some((token, close)) => {
                if open > 0 {
                    out.push(Segment::Literal(&rest[..open]));
                }
                out.push(Segment::Token(token));
                rest = &after_open[close + 1..];
            }
            None => {
                // Keep the brace and rescan just past it.
                out.push(Segment::Literal(&rest[..=open]));
                rest = after_open;
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

/// Tokens recognized in `template`, in order of appearance.
pub fn tokens(template: &str) -> Vec<Token> {
    scan(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Token(token) => Some(token),
            Segment::Literal(_) => None,
        })
        .collect()
}

fn lookup_lineage(
    ctx: &TemplateContext,
    lookup: Option<&dyn LineageLookup>,
) -> Result<Lineage, ArchiveError> {
    let Some(lookup) = lookup else {
        return Err(ArchiveError::LineageLookup {
            file: ctx.file_id.clone(),
            reason: "no lineage lookup available".to_string(),
        });
    };
    lookup.lineage(&ctx.file_id)
}

/// Expand every recognized token in `template` in a single pass. Expanded
/// values are never rescanned.
pub fn expand(
    template: &str,
    ctx: &TemplateContext,
    lookup: Option<&dyn LineageLookup>,
) -> Result<String, ArchiveError> {
    let segments = scan(template);

    let needs_lineage = segments
        .iter()
        .any(|s| matches!(s, Segment::Token(t) if t.is_lineage()));
    let lineage = if needs_lineage {
        Some(lookup_lineage(ctx, lookup)?)
    } else {
        None
    };
    let needs_version = segments.contains(&Segment::Token(Token::Version));
    let version = if needs_version {
        Some(ctx.version.resolve()?)
    } else {
        None
    };

    let lineage = lineage.as_ref();
    let date = ctx.file_date;
    let time = ctx.start_time;
    let mut out = String::with_capacity(template.len() + 16);
    for segment in segments {
        let token = match segment {
            Segment::Literal(text) => {
                out.push_str(text);
                continue;
            }
            Segment::Token(token) => token,
        };
        let value = match token {
            Token::Year => date.format("%Y").to_string(),
            Token::ShortYear => date.format("%y").to_string(),
            Token::Month => date.format("%m").to_string(),
            Token::MonthAbbrev => date.format("%b").to_string(),
            Token::Day => date.format("%d").to_string(),
            Token::DayOfYear => date.format("%j").to_string(),
            Token::Hour => time.format("%H").to_string(),
            Token::Minute => time.format("%M").to_string(),
            Token::Second => time.format("%S").to_string(),
            Token::Date => date.format("%Y%m%d").to_string(),
            Token::Version => version.map(|v| v.to_string()).unwrap_or_default(),
            Token::Instrument => lineage_name(lineage, |l| &l.instrument),
            Token::Satellite => lineage_name(lineage, |l| &l.satellite),
            Token::Mission => lineage_name(lineage, |l| &l.mission),
            Token::Product => lineage_name(lineage, |l| &l.product),
        };
        out.push_str(&value);
    }
    Ok(out)
}

fn lineage_name(lineage: Option<&Lineage>, pick: impl Fn(&Lineage) -> &String) -> String {
    lineage.map(|l| pick(l).clone()).unwrap_or_default()
}
