//! Stockledger engine - the stateful, concurrent side of Stockledger.
//!
//! Owns the record stores and serializes access to them:
//! - Document sequences, one counter per (code, period)
//! - Daily exchange rates with a resolved-rate cache
//! - FIFO cost layers behind per-(product, warehouse) locks
//! - The posting lock date and fiscal periods
//! - Journal entries
//!
//! Business rules live in `stockledger-core`; this crate only decides
//! when they run and under which lock. [`StockLedger`] is the entry point.

pub mod audit;
pub mod costing;
pub mod directory;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod lock_state;
pub mod rates;
pub mod sequence;

pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use directory::{AccountDirectory, CurrencyDirectory, InMemoryDirectory};
pub use error::{EngineError, EngineResult};
pub use ledger::{
    DraftJournal, GoodsReceipt, GoodsShipment, InboundMovement, IntegrationJournal,
    LedgerSettings, ReceiptRequest, ShipmentRequest, StockLedger,
};
pub use rates::RateInput;
