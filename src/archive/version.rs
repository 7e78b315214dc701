use crate::error::ArchiveError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Three-part file version. Field order drives the derived ordering, so
/// comparison is lexicographic over (interface, quality, revision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub interface: u32,
    pub quality: u32,
    pub revision: u32,
}

/// Which component a reprocessing run bumps (`--force 0|1|2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionComponent {
    Interface,
    Quality,
    Revision,
}

impl TryFrom<u8> for VersionComponent {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Interface),
            1 => Ok(Self::Quality),
            2 => Ok(Self::Revision),
            other => Err(format!("invalid version component {other}: use 0, 1 or 2")),
        }
    }
}

impl Version {
    pub const fn new(interface: u32, quality: u32, revision: u32) -> Self {
        Self {
            interface,
            quality,
            revision,
        }
    }

    pub fn parse(input: &str) -> Result<Self, ArchiveError> {
        let malformed = || ArchiveError::MalformedVersion(input.to_string());
        let mut parts = input.split('.');
        let mut next = || -> Result<u32, ArchiveError> {
            let raw = parts.next().ok_or_else(malformed)?;
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            raw.parse::<u32>().map_err(|_| malformed())
        };
        let interface = next()?;
        let quality = next()?;
        let revision = next()?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self::new(interface, quality, revision))
    }

    /// Increment `component` and zero everything below it.
    pub fn bump(self, component: VersionComponent) -> Self {
        match component {
            VersionComponent::Interface => Self::new(self.interface + 1, 0, 0),
            VersionComponent::Quality => Self::new(self.interface, self.quality + 1, 0),
            VersionComponent::Revision => {
                Self::new(self.interface, self.quality, self.revision + 1)
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.interface, self.quality, self.revision)
    }
}

impl FromStr for Version {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ArchiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cmp::Ordering;

    #[rstest]
    #[case("1.0.0", Version::new(1, 0, 0))]
    #[case("3.2.1", Version::new(3, 2, 1))]
    #[case("0.0.0", Version::new(0, 0, 0))]
    #[case("10.20.300", Version::new(10, 20, 300))]
    fn parse_accepts_three_integers(#[case] input: &str, #[case] expected: Version) {
        assert_eq!(Version::parse(input), Ok(expected));
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("1")]
    #[case("1.2")]
    #[case("1.2.3.4")]
    #[case("1.-2.3")]
    #[case("+1.2.3")]
    #[case("a.b.c")]
    #[case("1..3")]
    #[case(" 1.2.3")]
    #[case("v1.2.3")]
    #[case("99999999999.0.0")]
    fn parse_rejects_other_shapes(#[case] input: &str) {
        assert_eq!(
            Version::parse(input),
            Err(ArchiveError::MalformedVersion(input.to_string()))
        );
    }

    #[test]
    fn format_then_parse_is_identity() {
        for i in [0, 1, 9, 10, 255] {
            for q in [0, 3, 42] {
                for r in [0, 7, 1000] {
                    let v = Version::new(i, q, r);
                    assert_eq!(v.to_string().parse::<Version>(), Ok(v));
                }
            }
        }
    }

    #[test]
    fn ordering_is_interface_then_quality_then_revision() {
        let versions = [
            Version::new(0, 9, 9),
            Version::new(1, 0, 0),
            Version::new(1, 0, 1),
            Version::new(1, 1, 0),
            Version::new(2, 0, 0),
        ];
        for (ia, a) in versions.iter().enumerate() {
            for (ib, b) in versions.iter().enumerate() {
                assert_eq!(a.cmp(b), ia.cmp(&ib), "{a} vs {b}");
            }
        }
        assert_eq!(Version::new(1, 2, 3).cmp(&Version::new(1, 2, 3)), Ordering::Equal);
    }

    #[test]
    fn bump_resets_lower_components() {
        let v = Version::new(2, 3, 4);
        assert_eq!(v.bump(VersionComponent::Interface), Version::new(3, 0, 0));
        assert_eq!(v.bump(VersionComponent::Quality), Version::new(2, 4, 0));
        assert_eq!(v.bump(VersionComponent::Revision), Version::new(2, 3, 5));
    }

    #[test]
    fn component_from_force_flag() {
        assert_eq!(VersionComponent::try_from(0), Ok(VersionComponent::Interface));
        assert_eq!(VersionComponent::try_from(2), Ok(VersionComponent::Revision));
        assert!(VersionComponent::try_from(3).is_err());
    }

    #[test]
    fn serializes_as_canonical_string() {
        let json = serde_json::to_string(&Version::new(1, 2, 3)).expect("serialize");
        assert_eq!(json, "\"1.2.3\"");
        let back: Version = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Version::new(1, 2, 3));
        assert!(serde_json::from_str::<Version>("\"1.2\"").is_err());
    }
}
