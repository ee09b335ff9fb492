//! Shared holder for the posting lock date and fiscal periods.

use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;
use stockledger_core::fiscal::{
    FiscalError, FiscalPeriod, LockStateProvider, PeriodStatus, PostingLockState,
};
use tracing::info;

/// The administrative write path for [`PostingLockState`].
///
/// The guard only ever reads a snapshot through [`LockStateProvider`].
#[derive(Debug, Default)]
pub struct SharedLockState {
    inner: RwLock<PostingLockState>,
}

impl SharedLockState {
    /// Creates a holder with the given initial lock date and no periods.
    #[must_use]
    pub fn new(lock_date: Option<NaiveDate>) -> Self {
        Self {
            inner: RwLock::new(PostingLockState::new(lock_date)),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut PostingLockState) -> T) -> T {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Sets or clears the global lock date.
    pub fn set_lock_date(&self, lock_date: Option<NaiveDate>) {
        self.write(|state| state.set_lock_date(lock_date));
        info!(lock_date = ?lock_date, "Posting lock date changed");
    }

    /// Adds a period or replaces the one with the same code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodRange` or `OverlappingPeriod`.
    pub fn upsert_period(&self, period: FiscalPeriod) -> Result<(), FiscalError> {
        let code = period.code.clone();
        self.write(|state| state.upsert_period(period))?;
        info!(period = %code, "Fiscal period saved");
        Ok(())
    }

    /// Closes the period with `code`.
    ///
    /// # Errors
    ///
    /// Returns `FiscalError::PeriodNotFound`.
    pub fn close_period(&self, code: &str) -> Result<(), FiscalError> {
        self.write(|state| state.set_status(code, PeriodStatus::Closed))?;
        info!(period = %code, "Fiscal period closed");
        Ok(())
    }

    /// Reopens the period with `code`.
    ///
    /// # Errors
    ///
    /// Returns `FiscalError::PeriodNotFound`.
    pub fn reopen_period(&self, code: &str) -> Result<(), FiscalError> {
        self.write(|state| state.set_status(code, PeriodStatus::Open))?;
        info!(period = %code, "Fiscal period reopened");
        Ok(())
    }
}

impl LockStateProvider for SharedLockState {
    fn snapshot(&self) -> PostingLockState {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
