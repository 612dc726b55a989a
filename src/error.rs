use thiserror::Error;

/// Why a publication page could not be turned into metadata.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("structural mismatch in {block} block: {detail}")]
    StructuralMismatch { block: &'static str, detail: String },
    #[error("no authors found on page")]
    NoAuthors,
}

impl ExtractError {
    pub fn mismatch(block: &'static str, detail: impl Into<String>) -> Self {
        ExtractError::StructuralMismatch {
            block,
            detail: detail.into(),
        }
    }
}

/// Why metadata could not be turned into a bibliography entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("cannot format an entry without authors")]
    NoAuthors,
    #[error("unrecognised publication type: {0:?}")]
    Unclassified(String),
}
