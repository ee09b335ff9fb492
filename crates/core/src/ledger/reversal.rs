//! Reversing entries for posted journals.
//!
//! A reversal is a new entry with every debit and credit swapped. The
//! original is never touched.

use chrono::NaiveDate;
use stockledger_shared::types::JournalEntryId;

use super::error::LedgerError;
use super::types::{JournalEntry, JournalHeader, JournalLineInput, JournalStatus};

/// Header and lines of a reversal, ready for validation and posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalDraft {
    /// Header pointing back at the original.
    pub header: JournalHeader,
    /// Swapped lines.
    pub lines: Vec<JournalLineInput>,
}

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Builds the reversal of `original`.
    ///
    /// `existing_reversal` is the entry already reversing `original`, if
    /// the caller's store has one.
    ///
    /// For each original line:
    /// - Debits become credits
    /// - Credits become debits
    /// - All other fields are preserved
    /// - A memo is prefixed with "Reversal: ", a missing memo stays missing
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `original` is not posted
    /// - `CannotReverseReversal` if `original` is itself a reversal
    /// - `AlreadyReversed` if a reversal already exists
    pub fn prepare(
        original: &JournalEntry,
        existing_reversal: Option<JournalEntryId>,
        document_date: NaiveDate,
        reason: &str,
    ) -> Result<ReversalDraft, LedgerError> {
        if original.status != JournalStatus::Posted {
            return Err(LedgerError::InvalidState {
                entry_id: original.id,
                status: original.status,
                operation: "reverse",
            });
        }
        if let Some(reverses) = original.reverses {
            return Err(LedgerError::CannotReverseReversal {
                entry_id: original.id,
                reverses,
            });
        }
        if let Some(reversal_id) = existing_reversal {
            return Err(LedgerError::AlreadyReversed {
                entry_id: original.id,
                reversal_id,
            });
        }

        let lines = original
            .lines
            .iter()
            .map(|line| JournalLineInput {
                account_id: line.account_id,
                counterparty_id: line.counterparty_id,
                debit: line.credit,
                credit: line.debit,
                currency: line.currency.clone(),
                original_amount: line.original_amount,
                description: line
                    .description
                    .as_ref()
                    .map(|memo| format!("Reversal: {memo}")),
            })
            .collect();

        let number = original
            .document_number
            .clone()
            .unwrap_or_else(|| original.id.to_string());

        Ok(ReversalDraft {
            header: JournalHeader {
                document_date,
                description: format!("Reversal of {number}. Reason: {reason}"),
                source: original.source.clone(),
                reverses: Some(original.id),
            },
            lines,
        })
    }
}
