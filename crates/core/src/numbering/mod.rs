//! Document sequence keys, counters and number formatting.

pub mod error;
pub mod sequence;

pub use error::NumberingError;
pub use sequence::{DocumentNumber, SequenceCounter, SequenceKey, period_key};
