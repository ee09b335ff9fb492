//! Currency codes and the base-currency `Money` value.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts wrap `rust_decimal::Decimal` for arbitrary precision.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a valid ISO 4217 code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid currency code: '{0}'")]
pub struct CurrencyCodeError(pub String);

/// ISO 4217 currency code (three uppercase ASCII letters).
///
/// The set of currencies is master data owned by the surrounding
/// application, so this is a validated string rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalizes a currency code.
    ///
    /// Lowercase input is accepted and upper-cased.
    pub fn new(code: &str) -> Result<Self, CurrencyCodeError> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.len() == 3 && normalized.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(normalized))
        } else {
            Err(CurrencyCodeError(code.to_string()))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A monetary amount expressed in the base currency, together with the
/// document currency and amount it was converted from.
///
/// Every caller that converts document amounts composes this one value
/// instead of re-deriving conversion and rounding rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the base currency, already rounded to currency precision.
    pub amount_base: Decimal,
    /// Currency of the originating document.
    pub original_currency: CurrencyCode,
    /// Amount in the originating currency.
    pub original_amount: Decimal,
}

impl Money {
    /// Creates a value that was converted from a foreign currency.
    #[must_use]
    pub const fn converted(
        amount_base: Decimal,
        original_currency: CurrencyCode,
        original_amount: Decimal,
    ) -> Self {
        Self {
            amount_base,
            original_currency,
            original_amount,
        }
    }

    /// Creates a value already denominated in the base currency.
    #[must_use]
    pub fn base(amount: Decimal, base_currency: CurrencyCode) -> Self {
        Self {
            amount_base: amount,
            original_currency: base_currency,
            original_amount: amount,
        }
    }

    /// Creates a zero amount in the given currency.
    #[must_use]
    pub fn zero(currency: CurrencyCode) -> Self {
        Self::base(Decimal::ZERO, currency)
    }

    /// Returns true if the base amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount_base.is_zero()
    }

    /// Returns true if the base amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount_base.is_sign_negative() && !self.amount_base.is_zero()
    }

    /// Returns the original amount only when it differs in currency from `base`.
    ///
    /// Journal lines store the original amount as nullable when the document
    /// was already in base currency.
    #[must_use]
    pub fn original_if_foreign(&self, base: &CurrencyCode) -> Option<Decimal> {
        (&self.original_currency != base).then_some(self.original_amount)
    }
}
