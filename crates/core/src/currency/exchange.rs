//! Day-keyed exchange rate records and reference-day normalization.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::CurrencyCode;

/// Where a stored rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Entered by a user.
    Manual,
    /// Synchronized from an external rate feed.
    ExternalFeed,
}

/// Storage key of a rate: at most one rate per (from, to, day).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RateKey {
    /// Source currency.
    pub from: CurrencyCode,
    /// Target currency.
    pub to: CurrencyCode,
    /// Calendar day in the reference time zone.
    pub day: NaiveDate,
}

/// A directed daily rate: `1 from = rate to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency code.
    pub from_currency: CurrencyCode,
    /// Target currency code.
    pub to_currency: CurrencyCode,
    /// Calendar day this rate serves.
    pub day: NaiveDate,
    /// Multiplicative rate, stored at full precision.
    pub rate: Decimal,
    /// Provenance tag.
    pub source: RateSource,
    /// Optional provider or document reference.
    pub source_reference: Option<String>,
    /// When the rate was last written.
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Returns the storage key of this rate.
    #[must_use]
    pub fn key(&self) -> RateKey {
        RateKey {
            from: self.from_currency.clone(),
            to: self.to_currency.clone(),
            day: self.day,
        }
    }
}

/// Maps instants to the calendar day used for every day-keyed lookup.
///
/// A single fixed zone is used so that callers in different offsets never
/// disagree about which day's rate or sequence applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    zone: Tz,
}

impl ReferenceClock {
    /// Creates a clock keyed in `zone`.
    #[must_use]
    pub const fn new(zone: Tz) -> Self {
        Self { zone }
    }

    /// Returns the reference time zone.
    #[must_use]
    pub const fn zone(&self) -> Tz {
        self.zone
    }

    /// Returns the reference-zone calendar day containing `instant`.
    #[must_use]
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }

    /// Returns the current reference-zone day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.day_of(Utc::now())
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}
