//! Fiscal periods and the posting lock configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::FiscalPeriodId;

use super::error::FiscalError;

/// Status of a fiscal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period is open for postings.
    Open,
    /// Period is closed; postings require the override capability.
    Closed,
}

/// A fiscal period with an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Unique identifier.
    pub id: FiscalPeriodId,
    /// Human-readable code (e.g. "2024-03").
    pub code: String,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Current status.
    pub status: PeriodStatus,
}

impl FiscalPeriod {
    /// Creates an open period.
    pub fn open(code: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: FiscalPeriodId::new(),
            code: code.into(),
            start_date,
            end_date,
            status: PeriodStatus::Open,
        }
    }

    /// Returns true if postings are allowed in this period.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == PeriodStatus::Open
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}

/// Global lock date plus fiscal periods, as read by the posting guard.
///
/// The guard always works on a snapshot of this value taken at the start of
/// a posting attempt. Changes go through the administrative methods below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLockState {
    lock_date: Option<NaiveDate>,
    /// Non-overlapping, sorted by start date.
    periods: Vec<FiscalPeriod>,
}

impl PostingLockState {
    /// Creates a state with the given lock date and no periods.
    #[must_use]
    pub const fn new(lock_date: Option<NaiveDate>) -> Self {
        Self {
            lock_date,
            periods: Vec::new(),
        }
    }

    /// Postings dated on or before this day are blocked.
    #[must_use]
    pub const fn lock_date(&self) -> Option<NaiveDate> {
        self.lock_date
    }

    /// All periods sorted by start date.
    #[must_use]
    pub fn periods(&self) -> &[FiscalPeriod] {
        &self.periods
    }

    /// The period containing `date`, if any.
    #[must_use]
    pub fn period_for(&self, date: NaiveDate) -> Option<&FiscalPeriod> {
        self.periods.iter().find(|p| p.contains_date(date))
    }

    /// Moves the global lock date. `None` removes the lock.
    pub fn set_lock_date(&mut self, lock_date: Option<NaiveDate>) {
        self.lock_date = lock_date;
    }

    /// Inserts a period or replaces the one with the same code.
    ///
    /// # Errors
    ///
    /// - `InvalidPeriodRange` if the start is after the end
    /// - `OverlappingPeriod` if the range intersects another period
    pub fn upsert_period(&mut self, period: FiscalPeriod) -> Result<(), FiscalError> {
        if period.start_date > period.end_date {
            return Err(FiscalError::InvalidPeriodRange {
                code: period.code,
                start_date: period.start_date,
                end_date: period.end_date,
            });
        }

        if let Some(existing) = self
            .periods
            .iter()
            .find(|p| p.code != period.code && p.overlaps(&period))
        {
            return Err(FiscalError::OverlappingPeriod {
                code: period.code,
                existing: existing.code.clone(),
            });
        }

        self.periods.retain(|p| p.code != period.code);
        let position = self
            .periods
            .partition_point(|p| p.start_date < period.start_date);
        self.periods.insert(position, period);
        Ok(())
    }

    /// Changes the status of the period with `code`.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if no period has this code.
    pub fn set_status(&mut self, code: &str, status: PeriodStatus) -> Result<(), FiscalError> {
        let period = self
            .periods
            .iter_mut()
            .find(|p| p.code == code)
            .ok_or_else(|| FiscalError::PeriodNotFound(code.to_string()))?;
        period.status = status;
        Ok(())
    }
}
