//! Double-entry journal logic.
//!
//! This module implements the ledger rules used by the posting engine:
//! - Journal entries and lines (debits and credits)
//! - Line and balance validation
//! - Draft to posted transition
//! - Reversing entries
//! - Account and trial balances

pub mod balance;
pub mod error;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, NormalSide, TrialBalance};
pub use error::{LedgerError, LineViolation};
pub use reversal::{ReversalDraft, ReversalService};
pub use service::{BalanceTolerance, LedgerService};
pub use types::{
    JournalEntry, JournalHeader, JournalLine, JournalLineInput, JournalStatus, JournalTotals,
    SourceDocument, Side,
};
