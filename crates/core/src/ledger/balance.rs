//! Account balances and the trial balance over posted entries.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::AccountId;

use super::service::BalanceTolerance;
use super::types::{JournalEntry, JournalTotals};

/// Which side increases an account.
///
/// - Asset/Expense: balance = debit - credit
/// - Liability/Equity/Revenue: balance = credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    Credit,
}

impl NormalSide {
    /// Net balance of the given totals for an account on this side.
    #[must_use]
    pub fn balance(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Posted totals of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub const fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
        }
    }

    /// Net balance for an account with the given normal side.
    #[must_use]
    pub fn net(&self, normal: NormalSide) -> Decimal {
        normal.balance(self.debit_total, self.credit_total)
    }
}

/// Per-account totals over every posted entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Balances keyed by account.
    pub accounts: BTreeMap<AccountId, AccountBalance>,
    /// Grand totals.
    pub totals: JournalTotals,
}

impl TrialBalance {
    /// Aggregates posted entries; drafts are skipped.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a JournalEntry>) -> Self {
        let mut accounts: BTreeMap<AccountId, AccountBalance> = BTreeMap::new();
        let mut totals = JournalTotals::default();

        for entry in entries.into_iter().filter(|e| e.is_posted()) {
            for line in &entry.lines {
                let balance = accounts
                    .entry(line.account_id)
                    .or_insert_with(|| AccountBalance::new(line.account_id));
                balance.debit_total += line.debit;
                balance.credit_total += line.credit;
                totals.debit += line.debit;
                totals.credit += line.credit;
            }
        }

        Self { accounts, totals }
    }

    /// Balance of one account; zero if it was never posted to.
    #[must_use]
    pub fn account(&self, account_id: AccountId) -> AccountBalance {
        self.accounts
            .get(&account_id)
            .cloned()
            .unwrap_or_else(|| AccountBalance::new(account_id))
    }

    /// Returns true if total debits equal total credits within `tolerance`.
    #[must_use]
    pub fn is_balanced(&self, tolerance: BalanceTolerance) -> bool {
        tolerance.accepts(&self.totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::service::LedgerService;
    use crate::ledger::types::{JournalHeader, JournalLineInput};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use stockledger_shared::types::{ActorId, CurrencyCode};

    fn entry(lines: Vec<JournalLineInput>, post: bool) -> JournalEntry {
        let header = JournalHeader {
            document_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            description: String::new(),
            source: None,
            reverses: None,
        };
        let actor = ActorId::new();
        let mut entry = LedgerService::build_draft(header, lines, actor, Utc::now());
        if post {
            LedgerService::mark_posted(&mut entry, "JV-1".to_string(), actor, Utc::now()).unwrap();
        }
        entry
    }

    #[test]
    fn test_normal_side_balance() {
        assert_eq!(NormalSide::Debit.balance(dec!(100), dec!(30)), dec!(70));
        assert_eq!(NormalSide::Credit.balance(dec!(100), dec!(30)), dec!(-70));
    }

    #[test]
    fn test_trial_balance_skips_drafts() {
        let usd = CurrencyCode::new("USD").unwrap();
        let inventory = AccountId::new();
        let payable = AccountId::new();
        let entries = vec![
            entry(
                vec![
                    JournalLineInput::debit(inventory, dec!(50), usd.clone()),
                    JournalLineInput::credit(payable, dec!(50), usd.clone()),
                ],
                true,
            ),
            entry(
                vec![
                    JournalLineInput::debit(inventory, dec!(999), usd.clone()),
                    JournalLineInput::credit(payable, dec!(999), usd),
                ],
                false,
            ),
        ];

        let trial = TrialBalance::from_entries(&entries);
        assert_eq!(trial.account(inventory).net(NormalSide::Debit), dec!(50));
        assert_eq!(trial.account(payable).net(NormalSide::Credit), dec!(50));
        assert_eq!(trial.account(AccountId::new()).debit_total, Decimal::ZERO);
        assert!(trial.is_balanced(BalanceTolerance::default()));
    }
}
