//! Posting lock administration and ledger-wide checks.

use chrono::NaiveDate;
use serde_json::json;
use stockledger_core::fiscal::{Actor, FiscalPeriod, LockStateProvider, PostingLockState};
use stockledger_core::ledger::TrialBalance;

use super::StockLedger;
use crate::error::EngineResult;

impl StockLedger {
    /// Current lock date and periods.
    #[must_use]
    pub fn lock_state(&self) -> PostingLockState {
        self.lock_state.snapshot()
    }

    /// Moves or clears the global lock date.
    pub fn set_lock_date(&self, actor: &Actor, lock_date: Option<NaiveDate>) {
        self.lock_state.set_lock_date(lock_date);
        self.record(actor, "posting.lock_date_set", "lock_date", json!({ "lock_date": lock_date }));
    }

    /// Adds or replaces a fiscal period.
    ///
    /// # Errors
    ///
    /// `InvalidPeriodRange` or `OverlappingPeriod`.
    pub fn upsert_period(&self, actor: &Actor, period: FiscalPeriod) -> EngineResult<()> {
        let code = period.code.clone();
        let payload = json!({ "start": period.start_date, "end": period.end_date });
        self.lock_state.upsert_period(period)?;
        self.record(actor, "period.saved", code, payload);
        Ok(())
    }

    /// Closes a fiscal period to postings.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound`.
    pub fn close_period(&self, actor: &Actor, code: &str) -> EngineResult<()> {
        self.lock_state.close_period(code)?;
        self.record(actor, "period.closed", code, json!(null));
        Ok(())
    }

    /// Reopens a fiscal period.
    ///
    /// # Errors
    ///
    /// `PeriodNotFound`.
    pub fn reopen_period(&self, actor: &Actor, code: &str) -> EngineResult<()> {
        self.lock_state.reopen_period(code)?;
        self.record(actor, "period.reopened", code, json!(null));
        Ok(())
    }

    /// Per-account totals over every posted entry.
    pub async fn trial_balance(&self) -> TrialBalance {
        TrialBalance::from_entries(self.journals.read().await.entries())
    }

    /// Returns true if every cost layer agrees with its allocations and
    /// posted debits equal posted credits.
    pub async fn is_consistent(&self) -> bool {
        self.costing.is_consistent().await
            && self.trial_balance().await.is_balanced(self.settings.tolerance)
    }
}
