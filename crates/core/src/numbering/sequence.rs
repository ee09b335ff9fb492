//! Sequence keys and human-readable document numbers.
//!
//! A document number is `{CODE}-{PERIOD}-{SEQ}` where `PERIOD` is derived
//! from the document date (`YYYYMMDD` by default) and `SEQ` is zero-padded
//! to at least four digits, e.g. `JV-20240402-0007`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockledger_shared::config::SequenceGranularity;

use super::error::NumberingError;

/// Period key of `date` at the given granularity.
#[must_use]
pub fn period_key(date: NaiveDate, granularity: SequenceGranularity) -> String {
    let pattern = match granularity {
        SequenceGranularity::Day => "%Y%m%d",
        SequenceGranularity::Month => "%Y%m",
        SequenceGranularity::Year => "%Y",
    };
    date.format(pattern).to_string()
}

fn normalize_code(code: &str) -> Result<String, NumberingError> {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.is_empty()
        || !normalized
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(NumberingError::InvalidCode(code.to_string()));
    }
    Ok(normalized)
}

/// Counter identity: one document type in one period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey {
    /// Upper-cased document type code.
    pub code: String,
    /// Period key derived from the document date.
    pub period_key: String,
}

impl SequenceKey {
    /// Builds the key for `code` on `date`.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidCode` for an unusable type code.
    pub fn new(
        code: &str,
        date: NaiveDate,
        granularity: SequenceGranularity,
    ) -> Result<Self, NumberingError> {
        Ok(Self {
            code: normalize_code(code)?,
            period_key: period_key(date, granularity),
        })
    }

    /// Formats the document number for `sequence` under this key.
    #[must_use]
    pub fn number(&self, sequence: u64) -> DocumentNumber {
        DocumentNumber {
            code: self.code.clone(),
            period_key: self.period_key.clone(),
            sequence,
        }
    }
}

/// Next number to hand out for one key.
///
/// Not synchronized; the allocator keeps it under an exclusive lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    /// A counter whose first number is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// The number the next `take` returns.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Returns the current number and advances.
    pub fn take(&mut self) -> u64 {
        let current = self.next;
        self.next += 1;
        current
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// A formatted document number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber {
    /// Document type code.
    pub code: String,
    /// Period key.
    pub period_key: String,
    /// Sequence within the period.
    pub sequence: u64,
}

impl DocumentNumber {
    /// Parses a number produced by the `Display` implementation.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidNumber` if `value` does not have the
    /// `{CODE}-{PERIOD}-{SEQ}` shape.
    pub fn parse(value: &str) -> Result<Self, NumberingError> {
        let invalid = || NumberingError::InvalidNumber(value.to_string());

        let mut parts = value.rsplitn(3, '-');
        let sequence = parts.next().ok_or_else(invalid)?;
        let period = parts.next().ok_or_else(invalid)?;
        let code = parts.next().ok_or_else(invalid)?;

        let code = normalize_code(code).map_err(|_| invalid())?;
        if period.is_empty() || !period.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if sequence.len() < 4 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence: u64 = sequence.parse().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }

        Ok(Self {
            code,
            period_key: period.to_string(),
            sequence,
        })
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:04}", self.code, self.period_key, self.sequence)
    }
}

impl FromStr for DocumentNumber {
    type Err = NumberingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
