//! Journal entry and journal line types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::{
    AccountId, ActorId, CounterpartyId, CurrencyCode, JournalEntryId, JournalLineId, Money,
};

/// Side of a journal line.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit.
    Debit,
    /// Credit.
    Credit,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Journal entry lifecycle status.
///
/// `Draft --post--> Posted`; posted entries are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalStatus {
    /// Being authored; not part of the ledger yet.
    Draft,
    /// Committed to the ledger.
    Posted,
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Posted => f.write_str("posted"),
        }
    }
}

/// Business document a journal entry was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document type code (e.g. `GRN`, `INV`).
    pub doc_type: String,
    /// Document identifier in the calling application.
    pub doc_id: String,
}

impl SourceDocument {
    /// Creates a source reference.
    pub fn new(doc_type: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            doc_id: doc_id.into(),
        }
    }
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_type, self.doc_id)
    }
}

/// A candidate journal line supplied by the caller.
///
/// Amounts are in base currency. Exactly one of `debit` and `credit` must be
/// strictly positive; the other must be zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// Account to post to.
    pub account_id: AccountId,
    /// Optional customer or vendor.
    pub counterparty_id: Option<CounterpartyId>,
    /// Debit amount in base currency.
    pub debit: Decimal,
    /// Credit amount in base currency.
    pub credit: Decimal,
    /// Currency of the originating document.
    pub currency: CurrencyCode,
    /// Amount in `currency`; `None` when it is the base currency.
    pub original_amount: Option<Decimal>,
    /// Optional line memo.
    pub description: Option<String>,
}

impl JournalLineInput {
    /// A base-currency line on `side`.
    #[must_use]
    pub fn new(account_id: AccountId, side: Side, amount: Decimal, currency: CurrencyCode) -> Self {
        let (debit, credit) = match side {
            Side::Debit => (amount, Decimal::ZERO),
            Side::Credit => (Decimal::ZERO, amount),
        };
        Self {
            account_id,
            counterparty_id: None,
            debit,
            credit,
            currency,
            original_amount: None,
            description: None,
        }
    }

    /// A base-currency debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal, currency: CurrencyCode) -> Self {
        Self::new(account_id, Side::Debit, amount, currency)
    }

    /// A base-currency credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal, currency: CurrencyCode) -> Self {
        Self::new(account_id, Side::Credit, amount, currency)
    }

    /// A line for a converted amount, keeping the original currency amount
    /// when it differs from `base`.
    #[must_use]
    pub fn from_money(account_id: AccountId, side: Side, money: &Money, base: &CurrencyCode) -> Self {
        let mut line = Self::new(
            account_id,
            side,
            money.amount_base,
            money.original_currency.clone(),
        );
        line.original_amount = money.original_if_foreign(base);
        line
    }

    /// Attaches a counterparty.
    #[must_use]
    pub const fn with_counterparty(mut self, counterparty_id: CounterpartyId) -> Self {
        self.counterparty_id = Some(counterparty_id);
        self
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The side carrying the amount, judged by which column is positive.
    #[must_use]
    pub fn side(&self) -> Side {
        if self.debit > Decimal::ZERO {
            Side::Debit
        } else {
            Side::Credit
        }
    }
}

/// A stored journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Line ID.
    pub id: JournalLineId,
    /// 1-based position in the entry.
    pub line_no: usize,
    /// Account.
    pub account_id: AccountId,
    /// Optional customer or vendor.
    pub counterparty_id: Option<CounterpartyId>,
    /// Debit amount in base currency.
    pub debit: Decimal,
    /// Credit amount in base currency.
    pub credit: Decimal,
    /// Currency of the originating document.
    pub currency: CurrencyCode,
    /// Amount in `currency`; `None` when it is the base currency.
    pub original_amount: Option<Decimal>,
    /// Optional line memo.
    pub description: Option<String>,
}

impl JournalLine {
    pub(crate) fn from_input(line_no: usize, input: JournalLineInput) -> Self {
        Self {
            id: JournalLineId::new(),
            line_no,
            account_id: input.account_id,
            counterparty_id: input.counterparty_id,
            debit: input.debit,
            credit: input.credit,
            currency: input.currency,
            original_amount: input.original_amount,
            description: input.description,
        }
    }
}

/// Header fields shared by every way of creating an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalHeader {
    /// Accounting date.
    pub document_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Originating business document, if any.
    pub source: Option<SourceDocument>,
    /// Entry this one reverses, if any.
    pub reverses: Option<JournalEntryId>,
}

/// A draft or posted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Lifecycle status.
    pub status: JournalStatus,
    /// Document number, assigned when the entry is posted.
    pub document_number: Option<String>,
    /// Accounting date.
    pub document_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Originating business document, if any.
    pub source: Option<SourceDocument>,
    /// Entry this one reverses, if any.
    pub reverses: Option<JournalEntryId>,
    /// Author.
    pub created_by: ActorId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Poster, once posted.
    pub posted_by: Option<ActorId>,
    /// Posting time, once posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Lines in input order.
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Debit and credit totals of the entry.
    #[must_use]
    pub fn totals(&self) -> JournalTotals {
        JournalTotals {
            debit: self.lines.iter().map(|l| l.debit).sum(),
            credit: self.lines.iter().map(|l| l.credit).sum(),
        }
    }

    /// Returns true once the entry is part of the ledger.
    #[must_use]
    pub fn is_posted(&self) -> bool {
        self.status == JournalStatus::Posted
    }

    /// The lines as caller-shaped inputs, for re-validation.
    #[must_use]
    pub fn line_inputs(&self) -> Vec<JournalLineInput> {
        self.lines
            .iter()
            .map(|l| JournalLineInput {
                account_id: l.account_id,
                counterparty_id: l.counterparty_id,
                debit: l.debit,
                credit: l.credit,
                currency: l.currency.clone(),
                original_amount: l.original_amount,
                description: l.description.clone(),
            })
            .collect()
    }
}

/// Debit and credit totals in base currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl JournalTotals {
    /// `debit - credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}
