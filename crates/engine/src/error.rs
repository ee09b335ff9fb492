//! Engine error type aggregating the domain errors.

use stockledger_core::costing::CostingError;
use stockledger_core::currency::CurrencyError;
use stockledger_core::fiscal::FiscalError;
use stockledger_core::ledger::LedgerError;
use stockledger_core::numbering::NumberingError;
use stockledger_shared::AppError;
use thiserror::Error;

/// Result type alias using `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by engine operations.
///
/// Every failure is detected before the first mutation of the operation
/// that raised it, so an error always means nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Exchange rate resolution or maintenance failed.
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// Layer creation or consumption failed.
    #[error(transparent)]
    Costing(#[from] CostingError),

    /// Journal validation or lifecycle failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Posting guard denied the operation or period administration failed.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Document numbering failed.
    #[error(transparent)]
    Numbering(#[from] NumberingError),
}

impl EngineError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Currency(e) => e.error_code(),
            Self::Costing(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Fiscal(e) => e.error_code(),
            Self::Numbering(e) => e.error_code(),
        }
    }

    /// Returns true if the lock date or a closed period refused the
    /// operation; callers may retry with the override capability.
    #[must_use]
    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::Fiscal(e) if e.is_policy_denial())
    }

    /// Returns true if repeating the whole operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Costing(e) if e.is_retryable())
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match &err {
            EngineError::Fiscal(e) if e.is_policy_denial() => Self::PolicyDenied(message),
            EngineError::Fiscal(FiscalError::PeriodNotFound(_))
            | EngineError::Ledger(LedgerError::EntryNotFound(_))
            | EngineError::Currency(CurrencyError::CurrencyNotFound(_)) => Self::NotFound(message),
            EngineError::Ledger(
                LedgerError::InvalidState { .. }
                | LedgerError::AlreadyReversed { .. }
                | LedgerError::CannotReverseReversal { .. },
            )
            | EngineError::Costing(CostingError::StalePlan { .. }) => Self::Conflict(message),
            EngineError::Costing(CostingError::InsufficientStock { .. })
            | EngineError::Currency(
                CurrencyError::MissingRate { .. } | CurrencyError::CurrencyInactive(_),
            ) => Self::BusinessRule(message),
            _ => Self::Validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use stockledger_shared::types::{JournalEntryId, ProductId, WarehouseId};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn test_policy_denial_maps_to_forbidden() {
        let err = EngineError::from(FiscalError::PostingLocked {
            lock_date: date(),
            document_date: date(),
            context: "journal".to_string(),
        });
        assert!(err.is_policy_denial());
        assert_eq!(err.error_code(), "POSTING_LOCKED");
        assert_eq!(AppError::from(err).status_code(), 403);
    }

    #[test]
    fn test_classification() {
        let stock = EngineError::from(CostingError::InsufficientStock {
            product_id: ProductId::new(),
            warehouse_id: WarehouseId::new(),
            requested: dec!(5),
            available: dec!(3),
            missing: dec!(2),
        });
        assert!(!stock.is_policy_denial());
        assert!(!stock.is_retryable());
        assert_eq!(AppError::from(stock).status_code(), 422);

        let missing = EngineError::from(LedgerError::EntryNotFound(JournalEntryId::new()));
        assert_eq!(AppError::from(missing).status_code(), 404);

        let invalid = EngineError::from(LedgerError::InsufficientLines { count: 1 });
        assert_eq!(AppError::from(invalid).status_code(), 400);
    }

    #[test]
    fn test_message_is_preserved() {
        let err = EngineError::from(CostingError::InvalidQuantity {
            field: "quantity",
            value: dec!(0),
        });
        assert_eq!(
            AppError::from(err).to_string(),
            "Validation error: Invalid quantity: 0 (must be greater than zero)"
        );
    }
}
