use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("malformed version `{0}`: expected interface.quality.revision")]
    MalformedVersion(String),
    #[error("lineage lookup failed for {file}: {reason}")]
    LineageLookup { file: String, reason: String },
    #[error("could not extract {what} from {file}")]
    Extraction { file: String, what: &'static str },
    #[error("catalog invalid: {0}")]
    Catalog(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    W001LinkConflict,
    W002LinkFailure,
    W003ExtractionSkipped,
    W004CleanFailure,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::W001LinkConflict => "W001_LINK_CONFLICT",
            Self::W002LinkFailure => "W002_LINK_FAILURE",
            Self::W003ExtractionSkipped => "W003_EXTRACTION_SKIPPED",
            Self::W004CleanFailure => "W004_CLEAN_FAILURE",
        }
    }
}
