//! Ledger error types for validation and state errors.

use std::fmt;

use rust_decimal::Decimal;
use stockledger_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use super::types::JournalStatus;

/// What is wrong with a single journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineViolation {
    /// Both debit and credit are positive.
    BothSides,
    /// Neither debit nor credit is positive.
    NoAmount,
    /// Debit or credit is negative.
    Negative,
    /// The account does not exist.
    UnknownAccount(AccountId),
}

impl fmt::Display for LineViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothSides => f.write_str("debit and credit are both set"),
            Self::NoAmount => f.write_str("neither debit nor credit is set"),
            Self::Negative => f.write_str("amount is negative"),
            Self::UnknownAccount(id) => write!(f, "account {id} does not exist"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal must have at least 2 lines.
    #[error("Journal must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// A line breaks the debit/credit or account rules.
    #[error("Invalid journal line {line_no}: {violation}")]
    InvalidLine {
        /// 1-based line number.
        line_no: usize,
        /// Rule broken.
        violation: LineViolation,
    },

    /// Debits and credits differ by more than the tolerance.
    #[error(
        "Journal is not balanced. Debit: {debit}, Credit: {credit}, \
         difference {difference} exceeds tolerance {tolerance}"
    )]
    UnbalancedJournal {
        /// Total debit amount in base currency.
        debit: Decimal,
        /// Total credit amount in base currency.
        credit: Decimal,
        /// `debit - credit`.
        difference: Decimal,
        /// Tolerance applied.
        tolerance: Decimal,
    },

    // ========== State Errors ==========
    /// Operation not allowed in the entry's current status.
    #[error("Cannot {operation} journal entry {entry_id} in status {status}")]
    InvalidState {
        /// Entry.
        entry_id: JournalEntryId,
        /// Current status.
        status: JournalStatus,
        /// Attempted operation.
        operation: &'static str,
    },

    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// The entry already has a reversal.
    #[error("Journal entry {entry_id} is already reversed by {reversal_id}")]
    AlreadyReversed {
        /// Original entry.
        entry_id: JournalEntryId,
        /// Existing reversal.
        reversal_id: JournalEntryId,
    },

    /// The entry is itself a reversal.
    #[error("Journal entry {entry_id} reverses {reverses} and cannot be reversed")]
    CannotReverseReversal {
        /// Reversal entry.
        entry_id: JournalEntryId,
        /// Entry it reverses.
        reverses: JournalEntryId,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::UnbalancedJournal { .. } => "UNBALANCED_JOURNAL",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::CannotReverseReversal { .. } => "CANNOT_REVERSE_REVERSAL",
        }
    }

    /// Returns true for malformed posting input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InsufficientLines { .. } | Self::InvalidLine { .. } | Self::UnbalancedJournal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InsufficientLines { count: 1 }.error_code(),
            "INSUFFICIENT_LINES"
        );
        assert_eq!(
            LedgerError::EntryNotFound(JournalEntryId::new()).error_code(),
            "ENTRY_NOT_FOUND"
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedJournal {
            debit: dec!(100.00),
            credit: dec!(99.00),
            difference: dec!(1.00),
            tolerance: dec!(0.005),
        };
        assert_eq!(
            err.to_string(),
            "Journal is not balanced. Debit: 100.00, Credit: 99.00, \
             difference 1.00 exceeds tolerance 0.005"
        );

        let account = AccountId::new();
        let err = LedgerError::InvalidLine {
            line_no: 2,
            violation: LineViolation::UnknownAccount(account),
        };
        assert_eq!(
            err.to_string(),
            format!("Invalid journal line 2: account {account} does not exist")
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(LedgerError::InsufficientLines { count: 0 }.is_validation());
        assert!(
            !LedgerError::InvalidState {
                entry_id: JournalEntryId::new(),
                status: JournalStatus::Posted,
                operation: "post",
            }
            .is_validation()
        );
    }
}
