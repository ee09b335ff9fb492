//! Property-based tests for journal validation and reversal.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use stockledger_shared::types::{AccountId, ActorId, CurrencyCode};

use super::error::{LedgerError, LineViolation};
use super::reversal::ReversalService;
use super::service::{BalanceTolerance, LedgerService};
use super::types::{JournalHeader, JournalLineInput};

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

/// Debits split into random parts, balanced by one credit line.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLineInput>> {
    prop::collection::vec(positive_amount(), 1..10).prop_map(|debits| {
        let total: Decimal = debits.iter().copied().sum();
        let mut lines: Vec<JournalLineInput> = debits
            .into_iter()
            .map(|amount| JournalLineInput::debit(AccountId::new(), amount, usd()))
            .collect();
        lines.push(JournalLineInput::credit(AccountId::new(), total, usd()));
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balanced journals validate and report equal totals.
    #[test]
    fn prop_balanced_lines_accepted(lines in balanced_lines()) {
        let totals = LedgerService::validate_lines(&lines, BalanceTolerance::default(), |_| true)
            .unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Any cent of imbalance is rejected with the exact difference.
    #[test]
    fn prop_imbalance_rejected(lines in balanced_lines(), extra in positive_amount()) {
        let mut lines = lines;
        lines[0].debit += extra;
        let err = LedgerService::validate_lines(&lines, BalanceTolerance::default(), |_| true)
            .unwrap_err();
        prop_assert!(
            matches!(err, LedgerError::UnbalancedJournal { difference, .. } if difference == extra),
            "expected UnbalancedJournal with difference {}, got {:?}", extra, err
        );
    }

    /// A negative amount anywhere is rejected before the balance check.
    #[test]
    fn prop_negative_line_rejected(lines in balanced_lines(), index in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let i = index.index(lines.len());
        lines[i].debit = -lines[i].debit.max(lines[i].credit);
        lines[i].credit = Decimal::ZERO;
        let err = LedgerService::validate_lines(&lines, BalanceTolerance::default(), |_| true)
            .unwrap_err();
        prop_assert_eq!(
            err,
            LedgerError::InvalidLine { line_no: i + 1, violation: LineViolation::Negative }
        );
    }

    /// Reversing a posted entry yields a balanced entry that nets every
    /// account to zero.
    #[test]
    fn prop_reversal_nets_to_zero(lines in balanced_lines()) {
        let actor = ActorId::new();
        let header = JournalHeader {
            document_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            description: "Original".to_string(),
            source: None,
            reverses: None,
        };
        let mut entry = LedgerService::build_draft(header, lines, actor, Utc::now());
        LedgerService::mark_posted(&mut entry, "JV-20240131-0001".to_string(), actor, Utc::now())
            .unwrap();

        let draft = ReversalService::prepare(&entry, None, entry.document_date, "test").unwrap();
        prop_assert!(
            LedgerService::validate_lines(&draft.lines, BalanceTolerance::default(), |_| true).is_ok()
        );
        for (original, reversed) in entry.lines.iter().zip(&draft.lines) {
            prop_assert_eq!(original.debit - original.credit + reversed.debit - reversed.credit, Decimal::ZERO);
        }
    }
}
