//! The `StockLedger` facade: every operation business code calls.
//!
//! Each mutating operation follows the same shape:
//! 1. Consult the posting guard (for business postings)
//! 2. Await collaborator lookups
//! 3. Take the stock lock, then the journal lock
//! 4. Run every remaining check against what the locks protect
//! 5. Mutate, with no await and no fallible step in between
//!
//! A caller dropped at any await point therefore leaves no trace, and an
//! error always means nothing was written.

mod admin;
mod inventory;
mod journals;
mod settings;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde_json::json;
use stockledger_core::currency::{ExchangeRate, RateResolution};
use stockledger_core::fiscal::{Actor, PostingGuard, PostingPermit};
use stockledger_core::ledger::{JournalLineInput, LedgerService};
use stockledger_core::numbering::SequenceKey;
use stockledger_shared::types::{AccountId, CurrencyCode, Money};
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditSink};
use crate::costing::CostingEngine;
use crate::directory::{AccountDirectory, CurrencyDirectory};
use crate::error::EngineResult;
use crate::journal::JournalStore;
use crate::lock_state::SharedLockState;
use crate::rates::{ExchangeRateStore, RateInput};
use crate::sequence::SequenceAllocator;

pub use inventory::{GoodsReceipt, GoodsShipment, InboundMovement, ReceiptRequest, ShipmentRequest};
pub use journals::{DraftJournal, IntegrationJournal};
pub use settings::LedgerSettings;

/// Inventory costing and multi-currency ledger posting engine.
pub struct StockLedger {
    settings: LedgerSettings,
    sequences: SequenceAllocator,
    rates: ExchangeRateStore,
    costing: CostingEngine,
    lock_state: SharedLockState,
    journals: JournalStore,
    accounts: Arc<dyn AccountDirectory>,
    currencies: Arc<dyn CurrencyDirectory>,
    audit: Arc<dyn AuditSink>,
}

impl StockLedger {
    /// Creates an engine with empty stores.
    pub fn new(
        settings: LedgerSettings,
        accounts: Arc<dyn AccountDirectory>,
        currencies: Arc<dyn CurrencyDirectory>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            sequences: SequenceAllocator::new(settings.granularity),
            rates: ExchangeRateStore::new(
                settings.base_currency.clone(),
                settings.clock,
                settings.rate_cache_capacity,
            ),
            costing: CostingEngine::new(),
            lock_state: SharedLockState::new(settings.lock_date),
            journals: JournalStore::new(),
            accounts,
            currencies,
            audit,
            settings,
        }
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// The base currency every ledger amount is expressed in.
    #[must_use]
    pub const fn base_currency(&self) -> &CurrencyCode {
        &self.settings.base_currency
    }

    // ------------------------------------------------------------------
    // Numbering
    // ------------------------------------------------------------------

    /// Allocates the next number for `code` on `date`, formatted as
    /// `{CODE}-{PERIOD}-{SEQ}`.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidCode` for an unusable code.
    pub fn allocate_document_number(&self, code: &str, date: NaiveDate) -> EngineResult<String> {
        let number = self.sequences.allocate(code, date)?;
        info!(document_number = %number, "Document number allocated");
        Ok(number.to_string())
    }

    /// The sequence the next allocation for `code` on `date` would get.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidCode` for an unusable code.
    pub fn peek_document_number(&self, code: &str, date: NaiveDate) -> EngineResult<u64> {
        Ok(self.sequences.peek(code, date)?)
    }

    fn journal_key(&self, date: NaiveDate) -> EngineResult<SequenceKey> {
        Ok(self.sequences.key(&self.settings.journal_code, date)?)
    }

    // ------------------------------------------------------------------
    // Rates
    // ------------------------------------------------------------------

    /// Rate converting `from` into `to` on `day`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` naming the missing leg.
    pub fn resolve_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        day: NaiveDate,
    ) -> EngineResult<Decimal> {
        Ok(self.rates.resolve(from, to, day)?.rate)
    }

    /// Like [`StockLedger::resolve_rate`], also reporting how the rate was
    /// derived.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` naming the missing leg.
    pub fn rate_resolution(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        day: NaiveDate,
    ) -> EngineResult<RateResolution> {
        Ok(self.rates.resolve(from, to, day)?)
    }

    /// Rate for the reference day containing `at`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` naming the missing leg.
    pub fn resolve_rate_at(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        at: DateTime<Utc>,
    ) -> EngineResult<Decimal> {
        Ok(self.rates.resolve_at(from, to, at)?.rate)
    }

    /// Converts an amount to the base currency at the rate of `day`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` if there is no rate to base.
    pub fn convert_to_base(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        day: NaiveDate,
    ) -> EngineResult<Money> {
        Ok(self.rates.convert_to_base(amount, currency, day)?)
    }

    /// Stores or corrects a daily rate.
    ///
    /// # Errors
    ///
    /// `NonPositiveRate`, `SameCurrency`, `CurrencyNotFound` or
    /// `CurrencyInactive`.
    pub async fn upsert_rate(&self, actor: &Actor, input: RateInput) -> EngineResult<ExchangeRate> {
        let rate = self.rates.upsert(self.currencies.as_ref(), input).await?;
        self.audit.record(AuditEvent::new(
            actor.id,
            "rate.upserted",
            format!("{}/{}@{}", rate.from_currency, rate.to_currency, rate.day),
            json!({ "rate": rate.rate, "source": rate.source }),
        ));
        Ok(rate)
    }

    /// The stored rate for exactly (from, to, day).
    #[must_use]
    pub fn stored_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        day: NaiveDate,
    ) -> Option<ExchangeRate> {
        self.rates.get(from, to, day)
    }

    // ------------------------------------------------------------------
    // Guard
    // ------------------------------------------------------------------

    /// Asks the posting guard whether `actor` may post on `date`.
    ///
    /// # Errors
    ///
    /// `PostingLocked` or `PeriodClosed`.
    pub fn check_posting_allowed(
        &self,
        actor: &Actor,
        date: NaiveDate,
        context: &str,
    ) -> EngineResult<PostingPermit> {
        self.guard(actor, date, context, None)
    }

    fn guard(
        &self,
        actor: &Actor,
        date: NaiveDate,
        context: &str,
        override_reason: Option<&str>,
    ) -> EngineResult<PostingPermit> {
        let permit = PostingGuard::check(&self.lock_state, actor, date, context, override_reason)?;
        if permit.is_override() {
            warn!(
                actor = %actor.id,
                %date,
                context,
                reason = override_reason.unwrap_or_default(),
                "Posting guard overridden"
            );
        }
        Ok(permit)
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    /// Looks up every distinct account once and returns those that exist.
    async fn known_accounts(&self, ids: impl IntoIterator<Item = AccountId>) -> HashSet<AccountId> {
        let distinct: HashSet<AccountId> = ids.into_iter().collect();
        let lookups = distinct.into_iter().map(|id| async move {
            self.accounts.account_exists(id).await.then_some(id)
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    async fn validate(&self, lines: &[JournalLineInput]) -> EngineResult<()> {
        let known = self.known_accounts(lines.iter().map(|l| l.account_id)).await;
        LedgerService::validate_lines(lines, self.settings.tolerance, |id| known.contains(&id))?;
        Ok(())
    }

    fn record(&self, actor: &Actor, action: &'static str, subject: impl ToString, payload: serde_json::Value) {
        self.audit.record(AuditEvent::new(actor.id, action, subject, payload));
    }
}

fn permit_payload(permit: &PostingPermit) -> serde_json::Value {
    match permit {
        PostingPermit::Granted => json!(null),
        PostingPermit::Overridden { reason } => json!({ "reason": reason }),
    }
}
