//! Application-wide error types.
//!
//! Domain crates define their own detailed error enums; this is the
//! caller-facing classification the surrounding application renders.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input (quantities, journal lines, currency codes).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business policy refused the operation (lock date, closed period).
    ///
    /// Kept distinct from validation so callers can offer an override path.
    #[error("Policy denied: {0}")]
    PolicyDenied(String),

    /// Business rule violation that is not a caller input error
    /// (insufficient stock, missing exchange rate).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation attempted in the wrong lifecycle state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PolicyDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::BusinessRule(_) => 422,
            Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PolicyDenied(_) => "POLICY_DENIED",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::PolicyDenied(String::new()).status_code(), 403);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(AppError::BusinessRule(String::new()).status_code(), 422);
        assert_eq!(AppError::Config(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::PolicyDenied(String::new()).error_code(),
            "POLICY_DENIED"
        );
        assert_eq!(
            AppError::BusinessRule(String::new()).error_code(),
            "BUSINESS_RULE_VIOLATION"
        );
        assert_eq!(AppError::Conflict(String::new()).error_code(), "CONFLICT");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::PolicyDenied("msg".into()).to_string(),
            "Policy denied: msg"
        );
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
    }
}
