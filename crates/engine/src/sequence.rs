//! Gap-free document sequence allocation.

use chrono::NaiveDate;
use dashmap::DashMap;
use stockledger_core::numbering::{DocumentNumber, NumberingError, SequenceCounter, SequenceKey};
use stockledger_shared::config::SequenceGranularity;

/// Per-(code, period) counters.
///
/// The read-and-increment runs under the map's shard write lock, so
/// concurrent callers for the same key always get distinct consecutive
/// numbers starting at 1.
#[derive(Debug)]
pub struct SequenceAllocator {
    counters: DashMap<SequenceKey, SequenceCounter>,
    granularity: SequenceGranularity,
}

impl SequenceAllocator {
    /// Creates an allocator deriving period keys at `granularity`.
    #[must_use]
    pub fn new(granularity: SequenceGranularity) -> Self {
        Self {
            counters: DashMap::new(),
            granularity,
        }
    }

    /// Builds the sequence key for `code` on `date` without allocating.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidCode` for an unusable code.
    pub fn key(&self, code: &str, date: NaiveDate) -> Result<SequenceKey, NumberingError> {
        SequenceKey::new(code, date, self.granularity)
    }

    /// Allocates the next number under an already validated key.
    pub fn next(&self, key: &SequenceKey) -> DocumentNumber {
        let sequence = self.counters.entry(key.clone()).or_default().take();
        key.number(sequence)
    }

    /// Allocates the next document number for `code` on `date`.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidCode` for an unusable code.
    pub fn allocate(&self, code: &str, date: NaiveDate) -> Result<DocumentNumber, NumberingError> {
        let key = self.key(code, date)?;
        Ok(self.next(&key))
    }

    /// The number the next allocation for `code` on `date` would return.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidCode` for an unusable code.
    pub fn peek(&self, code: &str, date: NaiveDate) -> Result<u64, NumberingError> {
        let key = self.key(code, date)?;
        Ok(self
            .counters
            .get(&key)
            .map_or(1, |counter| counter.peek()))
    }
}
