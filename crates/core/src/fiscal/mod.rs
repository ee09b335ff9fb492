//! Fiscal periods, the posting lock date and the guard that enforces them.

pub mod error;
pub mod guard;
pub mod period;

pub use error::FiscalError;
pub use guard::{Actor, Capability, LockStateProvider, PostingGuard, PostingPermit};
pub use period::{FiscalPeriod, PeriodStatus, PostingLockState};
