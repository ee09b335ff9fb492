//! Multi-currency handling and exchange rates.
//!
//! All conversion and rounding goes through this module so that every
//! caller composes the same primitives.

pub mod allocation;
pub mod conversion;
pub mod error;
pub mod exchange;
pub mod resolver;

#[cfg(test)]
mod props;

pub use allocation::reconcile_to_total;
pub use conversion::{
    AMOUNT_SCALE, QUANTITY_EPSILON, QUANTITY_SCALE, convert_amount, extend,
    round_amount, round_quantity,
};
pub use error::CurrencyError;
pub use exchange::{ExchangeRate, RateKey, RateSource, ReferenceClock};
pub use resolver::{RateLookupMethod, RateResolution, RateResolver};
