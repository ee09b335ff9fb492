//! Journal validation and lifecycle rules.
//!
//! This module provides the pure business logic for validating candidate
//! lines and moving an entry through `Draft -> Posted` before it is stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::{AccountId, ActorId, JournalEntryId};

use super::error::{LedgerError, LineViolation};
use super::types::{
    JournalEntry, JournalHeader, JournalLine, JournalLineInput, JournalStatus, JournalTotals,
};

/// Absolute tolerance applied when comparing debit and credit totals.
///
/// This only absorbs representation noise; it is not a business tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceTolerance(Decimal);

impl BalanceTolerance {
    /// Tolerance used when none is configured.
    pub const DEFAULT: Self = Self(Decimal::from_parts(5, 0, 0, false, 3));

    /// Creates a tolerance; the sign is ignored.
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        Self(value.abs())
    }

    /// The tolerance value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns true if `totals` balance within this tolerance.
    #[must_use]
    pub fn accepts(self, totals: &JournalTotals) -> bool {
        totals.difference().abs() <= self.0
    }
}

impl Default for BalanceTolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Ledger service for journal validation and state transitions.
///
/// Stateless; storage and numbering belong to the caller.
pub struct LedgerService;

impl LedgerService {
    /// Validates candidate lines before anything is written.
    ///
    /// Checks, in order:
    /// 1. At least 2 lines
    /// 2. Each line has exactly one strictly positive side and no negatives
    /// 3. Each referenced account exists
    /// 4. Debits equal credits within `tolerance`
    ///
    /// # Errors
    ///
    /// Returns `InsufficientLines`, `InvalidLine` or `UnbalancedJournal`.
    pub fn validate_lines<A>(
        lines: &[JournalLineInput],
        tolerance: BalanceTolerance,
        account_exists: A,
    ) -> Result<JournalTotals, LedgerError>
    where
        A: Fn(AccountId) -> bool,
    {
        if lines.len() < 2 {
            return Err(LedgerError::InsufficientLines { count: lines.len() });
        }

        for (index, line) in lines.iter().enumerate() {
            let line_no = index + 1;
            if let Some(violation) = Self::line_violation(line) {
                return Err(LedgerError::InvalidLine { line_no, violation });
            }
            if !account_exists(line.account_id) {
                return Err(LedgerError::InvalidLine {
                    line_no,
                    violation: LineViolation::UnknownAccount(line.account_id),
                });
            }
        }

        let totals = Self::calculate_totals(lines);
        if !tolerance.accepts(&totals) {
            return Err(LedgerError::UnbalancedJournal {
                debit: totals.debit,
                credit: totals.credit,
                difference: totals.difference(),
                tolerance: tolerance.value(),
            });
        }

        Ok(totals)
    }

    fn line_violation(line: &JournalLineInput) -> Option<LineViolation> {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Some(LineViolation::Negative);
        }
        match (line.debit > Decimal::ZERO, line.credit > Decimal::ZERO) {
            (true, true) => Some(LineViolation::BothSides),
            (false, false) => Some(LineViolation::NoAmount),
            _ => None,
        }
    }

    /// Sums debit and credit columns.
    #[must_use]
    pub fn calculate_totals(lines: &[JournalLineInput]) -> JournalTotals {
        JournalTotals {
            debit: lines.iter().map(|l| l.debit).sum(),
            credit: lines.iter().map(|l| l.credit).sum(),
        }
    }

    /// Builds a draft entry from already validated lines.
    #[must_use]
    pub fn build_draft(
        header: JournalHeader,
        lines: Vec<JournalLineInput>,
        created_by: ActorId,
        created_at: DateTime<Utc>,
    ) -> JournalEntry {
        JournalEntry {
            id: JournalEntryId::new(),
            status: JournalStatus::Draft,
            document_number: None,
            document_date: header.document_date,
            description: header.description,
            source: header.source,
            reverses: header.reverses,
            created_by,
            created_at,
            posted_by: None,
            posted_at: None,
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(index, line)| JournalLine::from_input(index + 1, line))
                .collect(),
        }
    }

    /// Fails with `InvalidState` unless `entry` is a draft.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidState` naming `operation`.
    pub fn ensure_draft(entry: &JournalEntry, operation: &'static str) -> Result<(), LedgerError> {
        if entry.status == JournalStatus::Draft {
            Ok(())
        } else {
            Err(LedgerError::InvalidState {
                entry_id: entry.id,
                status: entry.status,
                operation,
            })
        }
    }

    /// Transitions a draft to posted, stamping number, poster and time.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidState` if the entry is not a draft.
    pub fn mark_posted(
        entry: &mut JournalEntry,
        document_number: String,
        posted_by: ActorId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        Self::ensure_draft(entry, "post")?;
        entry.status = JournalStatus::Posted;
        entry.document_number = Some(document_number);
        entry.posted_by = Some(posted_by);
        entry.posted_at = Some(posted_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use stockledger_shared::types::CurrencyCode;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    fn any_account(_: AccountId) -> bool {
        true
    }

    fn header() -> JournalHeader {
        JournalHeader {
            document_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            description: "Accrual".to_string(),
            source: None,
            reverses: None,
        }
    }

    #[test]
    fn test_three_line_balanced_journal() {
        let lines = vec![
            JournalLineInput::debit(AccountId::new(), dec!(100.00), usd()),
            JournalLineInput::credit(AccountId::new(), dec!(60.00), usd()),
            JournalLineInput::credit(AccountId::new(), dec!(40.00), usd()),
        ];
        let totals =
            LedgerService::validate_lines(&lines, BalanceTolerance::default(), any_account).unwrap();
        assert_eq!(totals.debit, dec!(100.00));
        assert_eq!(totals.credit, dec!(100.00));
    }

    #[test]
    fn test_unbalanced_journal_rejected() {
        let lines = vec![
            JournalLineInput::debit(AccountId::new(), dec!(100.00), usd()),
            JournalLineInput::credit(AccountId::new(), dec!(99.00), usd()),
        ];
        let err = LedgerService::validate_lines(&lines, BalanceTolerance::default(), any_account)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::UnbalancedJournal {
                debit: dec!(100.00),
                credit: dec!(99.00),
                difference: dec!(1.00),
                tolerance: dec!(0.005),
            }
        );
    }

    #[test]
    fn test_difference_within_tolerance_accepted() {
        let lines = vec![
            JournalLineInput::debit(AccountId::new(), dec!(100.004), usd()),
            JournalLineInput::credit(AccountId::new(), dec!(100.00), usd()),
        ];
        assert!(
            LedgerService::validate_lines(&lines, BalanceTolerance::default(), any_account).is_ok()
        );
        assert!(
            LedgerService::validate_lines(&lines, BalanceTolerance::new(dec!(0.001)), any_account)
                .is_err()
        );
    }

    #[rstest]
    #[case::empty(0)]
    #[case::single(1)]
    fn test_insufficient_lines(#[case] count: usize) {
        let lines: Vec<_> = (0..count)
            .map(|_| JournalLineInput::debit(AccountId::new(), dec!(1), usd()))
            .collect();
        assert_eq!(
            LedgerService::validate_lines(&lines, BalanceTolerance::default(), any_account),
            Err(LedgerError::InsufficientLines { count })
        );
    }

    #[rstest]
    #[case::both(dec!(10), dec!(10), LineViolation::BothSides)]
    #[case::neither(dec!(0), dec!(0), LineViolation::NoAmount)]
    #[case::negative_debit(dec!(-10), dec!(0), LineViolation::Negative)]
    #[case::negative_credit(dec!(0), dec!(-10), LineViolation::Negative)]
    fn test_invalid_line_shapes(
        #[case] debit: Decimal,
        #[case] credit: Decimal,
        #[case] expected: LineViolation,
    ) {
        let mut bad = JournalLineInput::debit(AccountId::new(), dec!(1), usd());
        bad.debit = debit;
        bad.credit = credit;
        let lines = vec![
            JournalLineInput::debit(AccountId::new(), dec!(10), usd()),
            bad,
        ];
        assert_eq!(
            LedgerService::validate_lines(&lines, BalanceTolerance::default(), any_account),
            Err(LedgerError::InvalidLine {
                line_no: 2,
                violation: expected,
            })
        );
    }

    #[test]
    fn test_unknown_account_named() {
        let known = AccountId::new();
        let unknown = AccountId::new();
        let lines = vec![
            JournalLineInput::debit(known, dec!(10), usd()),
            JournalLineInput::credit(unknown, dec!(10), usd()),
        ];
        assert_eq!(
            LedgerService::validate_lines(&lines, BalanceTolerance::default(), |id| id == known),
            Err(LedgerError::InvalidLine {
                line_no: 2,
                violation: LineViolation::UnknownAccount(unknown),
            })
        );
    }

    #[test]
    fn test_draft_then_post_exactly_once() {
        let actor = ActorId::new();
        let lines = vec![
            JournalLineInput::debit(AccountId::new(), dec!(10), usd()),
            JournalLineInput::credit(AccountId::new(), dec!(10), usd()),
        ];
        let mut entry = LedgerService::build_draft(header(), lines, actor, Utc::now());
        assert_eq!(entry.status, JournalStatus::Draft);
        assert_eq!(entry.lines[1].line_no, 2);
        assert!(entry.document_number.is_none());

        LedgerService::mark_posted(&mut entry, "JV-20240402-0001".to_string(), actor, Utc::now())
            .unwrap();
        assert!(entry.is_posted());
        assert_eq!(entry.posted_by, Some(actor));

        let err = LedgerService::mark_posted(&mut entry, "JV-20240402-0002".to_string(), actor, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { operation: "post", .. }));
        assert_eq!(entry.document_number.as_deref(), Some("JV-20240402-0001"));
    }
}
