//! FIFO inventory costing.
//!
//! Every inbound movement creates a cost layer; every outbound movement
//! draws from the oldest layers first and records one allocation per layer
//! touched.

pub mod error;
pub mod fifo;
pub mod types;

#[cfg(test)]
mod fifo_props;

pub use error::CostingError;
pub use fifo::{ConsumptionPlan, FifoQueue, PreparedLayer};
pub use types::{
    ConsumptionResult, CostAllocation, CostLayer, InboundKind, SourceRef, StockKey,
};
