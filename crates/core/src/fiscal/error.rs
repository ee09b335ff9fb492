//! Posting lock and fiscal period errors.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the posting guard and period administration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiscalError {
    /// Document date is on or before the global lock date.
    #[error("Posting locked: {context} dated {document_date} is on or before lock date {lock_date}")]
    PostingLocked {
        /// Configured lock date.
        lock_date: NaiveDate,
        /// Date of the rejected document.
        document_date: NaiveDate,
        /// Caller-supplied description of the attempted action.
        context: String,
    },

    /// Document date falls in a closed fiscal period.
    #[error("Fiscal period {period_code} is closed for {document_date}")]
    PeriodClosed {
        /// Code of the closed period.
        period_code: String,
        /// Date of the rejected document.
        document_date: NaiveDate,
    },

    /// Period start is after its end.
    #[error("Fiscal period {code} has invalid range {start_date}..{end_date}")]
    InvalidPeriodRange {
        /// Period code.
        code: String,
        /// Start date.
        start_date: NaiveDate,
        /// End date.
        end_date: NaiveDate,
    },

    /// Period overlaps another period.
    #[error("Fiscal period {code} overlaps period {existing}")]
    OverlappingPeriod {
        /// Code of the rejected period.
        code: String,
        /// Code of the period it overlaps.
        existing: String,
    },

    /// No period with this code.
    #[error("Fiscal period not found: {0}")]
    PeriodNotFound(String),
}

impl FiscalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PostingLocked { .. } => "POSTING_LOCKED",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::InvalidPeriodRange { .. } => "INVALID_PERIOD_RANGE",
            Self::OverlappingPeriod { .. } => "OVERLAPPING_PERIOD",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
        }
    }

    /// Returns true if the error is a business policy denial that an actor
    /// with the override capability could bypass.
    #[must_use]
    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::PostingLocked { .. } | Self::PeriodClosed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_locked_names_lock_date_and_context() {
        let err = FiscalError::PostingLocked {
            lock_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            document_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            context: "invoice INV-7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Posting locked: invoice INV-7 dated 2024-03-31 is on or before lock date 2024-03-31"
        );
        assert!(err.is_policy_denial());
    }

    #[test]
    fn test_admin_errors_are_not_policy_denials() {
        assert!(!FiscalError::PeriodNotFound("2024-01".to_string()).is_policy_denial());
        assert_eq!(
            FiscalError::PeriodNotFound("2024-01".to_string()).error_code(),
            "PERIOD_NOT_FOUND"
        );
    }
}
