//! Currency and exchange rate errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stockledger_shared::types::CurrencyCode;
use thiserror::Error;

/// Errors raised by rate resolution and rate maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// No usable rate for the pair on the day. Never defaulted to 1.
    #[error("No exchange rate found for {from} to {to} on {day}")]
    MissingRate {
        /// Source currency of the missing leg.
        from: CurrencyCode,
        /// Target currency of the missing leg.
        to: CurrencyCode,
        /// Reference day of the lookup.
        day: NaiveDate,
    },

    /// A rate must be strictly positive.
    #[error("Exchange rate for {from} to {to} must be positive, got {rate}")]
    NonPositiveRate {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
        /// Rejected rate.
        rate: Decimal,
    },

    /// Source and target currencies must differ for a stored rate.
    #[error("Source and target currencies must be different, got {0} twice")]
    SameCurrency(CurrencyCode),

    /// Currency is not known to the currency master data.
    #[error("Currency '{0}' not found")]
    CurrencyNotFound(CurrencyCode),

    /// Currency exists but is not active.
    #[error("Currency '{0}' is inactive")]
    CurrencyInactive(CurrencyCode),

    /// The cross rate derived through the pivot does not fit in a `Decimal`.
    #[error("Exchange rate for {from} to {to} on {day} is out of range")]
    RateOverflow {
        /// Source currency.
        from: CurrencyCode,
        /// Target currency.
        to: CurrencyCode,
        /// Reference day of the lookup.
        day: NaiveDate,
    },

    /// A converted amount does not fit in a `Decimal`.
    #[error("Converting {amount} {currency} is out of range")]
    AmountOverflow {
        /// Currency of the amount.
        currency: CurrencyCode,
        /// Amount being converted.
        amount: Decimal,
    },
}

impl CurrencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRate { .. } => "MISSING_RATE",
            Self::NonPositiveRate { .. } => "NON_POSITIVE_RATE",
            Self::SameCurrency(_) => "SAME_CURRENCY_EXCHANGE",
            Self::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            Self::CurrencyInactive(_) => "CURRENCY_INACTIVE",
            Self::RateOverflow { .. } => "RATE_OVERFLOW",
            Self::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rate_names_pair_and_day() {
        let err = CurrencyError::MissingRate {
            from: CurrencyCode::new("EUR").unwrap(),
            to: CurrencyCode::new("TRY").unwrap(),
            day: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "No exchange rate found for EUR to TRY on 2024-01-15"
        );
        assert_eq!(err.error_code(), "MISSING_RATE");
    }
}
