//! Exchange rate resolution through the base (pivot) currency.
//!
//! Lookup order for `from -> to` on a reference day:
//! 1. Same currency: rate 1
//! 2. Direct stored rate `from -> to`, if positive
//! 3. `to` is the pivot: nothing left to try
//! 4. `from` is the pivot: reciprocal of `to -> pivot`
//! 5. Otherwise: `(from -> pivot) / (to -> pivot)`
//!
//! Any missing leg fails with `MissingRate` naming that leg.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::{CurrencyCode, Money};

use super::conversion::{convert_amount, round_amount};
use super::error::CurrencyError;

/// How a resolved rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLookupMethod {
    /// Same currency on both sides.
    Identity,
    /// A stored rate for exactly this pair.
    Direct,
    /// Derived from one or two legs against the pivot currency.
    ViaPivot,
}

/// A resolved rate together with how it was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateResolution {
    /// Multiplicative rate: `1 from = rate to`.
    pub rate: Decimal,
    /// How the rate was obtained.
    pub method: RateLookupMethod,
    /// Reference day the rate serves.
    pub day: NaiveDate,
}

/// Stateless resolver parameterized by the pivot currency.
///
/// Storage is supplied as a lookup function returning the stored rate for
/// an exact `(from, to, day)` key, so the same rules serve the engine, the
/// tests and any future persistent store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateResolver {
    pivot: CurrencyCode,
}

impl RateResolver {
    /// Creates a resolver pivoting through `pivot`.
    #[must_use]
    pub const fn new(pivot: CurrencyCode) -> Self {
        Self { pivot }
    }

    /// Returns the pivot (base) currency.
    #[must_use]
    pub const fn pivot(&self) -> &CurrencyCode {
        &self.pivot
    }

    /// Resolves the rate converting `from` into `to` on `day`.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` naming the first missing leg, or
    /// `RateOverflow` if the cross rate does not fit in a `Decimal`.
    pub fn resolve<F>(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        day: NaiveDate,
        lookup: F,
    ) -> Result<RateResolution, CurrencyError>
    where
        F: Fn(&CurrencyCode, &CurrencyCode, NaiveDate) -> Option<Decimal>,
    {
        if from == to {
            return Ok(RateResolution {
                rate: Decimal::ONE,
                method: RateLookupMethod::Identity,
                day,
            });
        }

        if let Some(rate) = positive(lookup(from, to, day)) {
            return Ok(RateResolution {
                rate,
                method: RateLookupMethod::Direct,
                day,
            });
        }

        let missing = |a: &CurrencyCode, b: &CurrencyCode| CurrencyError::MissingRate {
            from: a.clone(),
            to: b.clone(),
            day,
        };
        let overflow = |a: &CurrencyCode, b: &CurrencyCode| CurrencyError::RateOverflow {
            from: a.clone(),
            to: b.clone(),
            day,
        };

        let rate = if to == &self.pivot {
            // The direct lookup above was the only leg.
            return Err(missing(from, to));
        } else if from == &self.pivot {
            let to_pivot =
                positive(lookup(to, &self.pivot, day)).ok_or_else(|| missing(to, &self.pivot))?;
            Decimal::ONE
                .checked_div(to_pivot)
                .ok_or_else(|| overflow(from, to))?
        } else {
            let from_pivot = positive(lookup(from, &self.pivot, day))
                .ok_or_else(|| missing(from, &self.pivot))?;
            let to_pivot =
                positive(lookup(to, &self.pivot, day)).ok_or_else(|| missing(to, &self.pivot))?;
            from_pivot
                .checked_div(to_pivot)
                .ok_or_else(|| overflow(from, to))?
        };

        Ok(RateResolution {
            rate,
            method: RateLookupMethod::ViaPivot,
            day,
        })
    }

    /// Converts a document amount into the base currency.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyError::MissingRate` if the currency has no rate to
    /// the base currency on `day`, or `AmountOverflow` if the converted
    /// amount does not fit.
    pub fn to_base<F>(
        &self,
        amount: Decimal,
        currency: &CurrencyCode,
        day: NaiveDate,
        lookup: F,
    ) -> Result<Money, CurrencyError>
    where
        F: Fn(&CurrencyCode, &CurrencyCode, NaiveDate) -> Option<Decimal>,
    {
        if currency == &self.pivot {
            return Ok(Money::base(round_amount(amount), currency.clone()));
        }
        let resolution = self.resolve(currency, &self.pivot, day, lookup)?;
        let amount_base = convert_amount(amount, resolution.rate).ok_or_else(|| {
            CurrencyError::AmountOverflow {
                currency: currency.clone(),
                amount,
            }
        })?;
        Ok(Money::converted(amount_base, currency.clone(), amount))
    }
}

fn positive(rate: Option<Decimal>) -> Option<Decimal> {
    rate.filter(|r| *r > Decimal::ZERO)
}
