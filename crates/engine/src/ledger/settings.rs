//! Engine settings derived from configuration.

use chrono::NaiveDate;
use stockledger_core::currency::ReferenceClock;
use stockledger_core::ledger::BalanceTolerance;
use stockledger_core::numbering::SequenceKey;
use stockledger_shared::config::SequenceGranularity;
use stockledger_shared::types::CurrencyCode;
use stockledger_shared::{AppConfig, AppError};

/// Validated settings for a [`StockLedger`](super::StockLedger).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Base (reporting and pivot) currency.
    pub base_currency: CurrencyCode,
    /// Zone every calendar day is keyed in.
    pub clock: ReferenceClock,
    /// Balance check tolerance.
    pub tolerance: BalanceTolerance,
    /// Upper-cased type code for journal entry numbers.
    pub journal_code: String,
    /// Period granularity for document sequences.
    pub granularity: SequenceGranularity,
    /// Resolved-rate cache size.
    pub rate_cache_capacity: u64,
    /// Lock date in force at startup.
    pub lock_date: Option<NaiveDate>,
}

impl LedgerSettings {
    /// Defaults around `base_currency`: UTC days, 0.005 tolerance, `JV`
    /// daily numbering, no lock date.
    #[must_use]
    pub fn new(base_currency: CurrencyCode) -> Self {
        Self {
            base_currency,
            clock: ReferenceClock::default(),
            tolerance: BalanceTolerance::DEFAULT,
            journal_code: "JV".to_string(),
            granularity: SequenceGranularity::Day,
            rate_cache_capacity: 10_000,
            lock_date: None,
        }
    }

    /// Builds settings from the loaded application configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unknown currency code or time
    /// zone, a negative tolerance or an unusable journal code.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let ledger = &config.ledger;
        let journal_code = SequenceKey::new(
            &ledger.journal_code,
            NaiveDate::default(),
            ledger.sequence_granularity,
        )
        .map_err(|e| AppError::Config(e.to_string()))?
        .code;

        Ok(Self {
            base_currency: ledger.base_currency()?,
            clock: ReferenceClock::new(ledger.reference_timezone()?),
            tolerance: BalanceTolerance::new(ledger.balance_tolerance()?),
            journal_code,
            granularity: ledger.sequence_granularity,
            rate_cache_capacity: config.rates.cache_capacity,
            lock_date: ledger.lock_date,
        })
    }
}
