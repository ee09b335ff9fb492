//! Exchange rate storage with a resolved-rate cache.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use moka::sync::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_core::currency::{
    CurrencyError, ExchangeRate, RateKey, RateResolution, RateResolver, RateSource, ReferenceClock,
};
use stockledger_shared::types::{CurrencyCode, Money};
use tracing::{debug, info};

use crate::directory::CurrencyDirectory;

/// A rate to store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateInput {
    /// Source currency.
    pub from_currency: CurrencyCode,
    /// Target currency.
    pub to_currency: CurrencyCode,
    /// Reference day the rate serves.
    pub day: NaiveDate,
    /// `1 from = rate to`.
    pub rate: Decimal,
    /// Provenance tag.
    pub source: RateSource,
    /// Optional provider or document reference.
    pub source_reference: Option<String>,
}

/// Day-keyed rates, one per (from, to, day).
///
/// Cache entries are tagged with the generation they were computed in.
/// An upsert bumps the generation after writing, so a resolution computed
/// from older rates can never be served afterwards even if it lands in
/// the cache late.
pub struct ExchangeRateStore {
    rates: DashMap<RateKey, ExchangeRate>,
    cache: Cache<(u64, RateKey), RateResolution>,
    generation: AtomicU64,
    resolver: RateResolver,
    clock: ReferenceClock,
}

impl ExchangeRateStore {
    /// Creates an empty store pivoting through `base`.
    #[must_use]
    pub fn new(base: CurrencyCode, clock: ReferenceClock, cache_capacity: u64) -> Self {
        Self {
            rates: DashMap::new(),
            cache: Cache::builder().max_capacity(cache_capacity).build(),
            generation: AtomicU64::new(0),
            resolver: RateResolver::new(base),
            clock,
        }
    }

    /// The base (pivot) currency.
    #[must_use]
    pub fn base_currency(&self) -> &CurrencyCode {
        self.resolver.pivot()
    }

    /// The clock used to derive reference days.
    #[must_use]
    pub const fn clock(&self) -> ReferenceClock {
        self.clock
    }

    /// Inserts or overwrites the rate for (from, to, day).
    ///
    /// # Errors
    ///
    /// - `NonPositiveRate` if `rate <= 0`
    /// - `SameCurrency` if from and to are equal
    /// - `CurrencyNotFound` or `CurrencyInactive` for either side
    pub async fn upsert<D>(&self, directory: &D, input: RateInput) -> Result<ExchangeRate, CurrencyError>
    where
        D: CurrencyDirectory + ?Sized,
    {
        if input.rate <= Decimal::ZERO {
            return Err(CurrencyError::NonPositiveRate {
                from: input.from_currency,
                to: input.to_currency,
                rate: input.rate,
            });
        }
        if input.from_currency == input.to_currency {
            return Err(CurrencyError::SameCurrency(input.from_currency));
        }
        for code in [&input.from_currency, &input.to_currency] {
            match directory.currency_status(code).await {
                None => return Err(CurrencyError::CurrencyNotFound(code.clone())),
                Some(false) => return Err(CurrencyError::CurrencyInactive(code.clone())),
                Some(true) => {}
            }
        }

        let record = ExchangeRate {
            from_currency: input.from_currency,
            to_currency: input.to_currency,
            day: input.day,
            rate: input.rate.normalize(),
            source: input.source,
            source_reference: input.source_reference,
            updated_at: Utc::now(),
        };
        self.rates.insert(record.key(), record.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();

        info!(
            from = %record.from_currency,
            to = %record.to_currency,
            day = %record.day,
            rate = %record.rate,
            "Exchange rate upserted"
        );
        Ok(record)
    }

    /// The stored rate for exactly (from, to, day), if any.
    #[must_use]
    pub fn get(&self, from: &CurrencyCode, to: &CurrencyCode, day: NaiveDate) -> Option<ExchangeRate> {
        let key = RateKey {
            from: from.clone(),
            to: to.clone(),
            day,
        };
        self.rates.get(&key).map(|r| r.clone())
    }

    fn lookup(&self, from: &CurrencyCode, to: &CurrencyCode, day: NaiveDate) -> Option<Decimal> {
        let key = RateKey {
            from: from.clone(),
            to: to.clone(),
            day,
        };
        self.rates.get(&key).map(|r| r.rate)
    }

    /// Resolves `from -> to` on a reference day, directly or via the pivot.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` naming the missing leg.
    pub fn resolve(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        day: NaiveDate,
    ) -> Result<RateResolution, CurrencyError> {
        let generation = self.generation.load(Ordering::Acquire);
        let key = (
            generation,
            RateKey {
                from: from.clone(),
                to: to.clone(),
                day,
            },
        );
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let resolution = self
            .resolver
            .resolve(from, to, day, |f, t, d| self.lookup(f, t, d))?;
        debug!(%from, %to, %day, method = ?resolution.method, "Rate resolved");
        self.cache.insert(key, resolution);
        Ok(resolution)
    }

    /// Resolves the rate for the reference day containing `at`.
    ///
    /// # Errors
    ///
    /// See [`ExchangeRateStore::resolve`].
    pub fn resolve_at(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        at: DateTime<Utc>,
    ) -> Result<RateResolution, CurrencyError> {
        self.resolve(from, to, self.clock.day_of(at))
    }

    /// Converts `amount` in `currency` to the base currency.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` if no rate to the base exists.
    pub fn convert_to_base(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        day: NaiveDate,
    ) -> Result<Money, CurrencyError> {
        let base = self.resolver.pivot();
        if currency == base {
            return self
                .resolver
                .to_base(amount, currency, day, |_, _, _| None);
        }
        let resolution = self.resolve(currency, base, day)?;
        self.resolver
            .to_base(amount, currency, day, |_, _, _| Some(resolution.rate))
    }
}
