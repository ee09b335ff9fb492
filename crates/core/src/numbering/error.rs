//! Document numbering errors.

use thiserror::Error;

/// Errors raised while building or parsing document numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberingError {
    /// Type code is empty or contains characters other than ASCII
    /// letters, digits and underscores.
    #[error("Invalid document type code: '{0}'")]
    InvalidCode(String),

    /// String is not a `{CODE}-{PERIOD}-{SEQ}` document number.
    #[error("Invalid document number: '{0}'")]
    InvalidNumber(String),
}

impl NumberingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode(_) => "INVALID_DOCUMENT_CODE",
            Self::InvalidNumber(_) => "INVALID_DOCUMENT_NUMBER",
        }
    }
}
