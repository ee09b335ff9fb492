//! Cost layer and allocation records.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::{AllocationId, LayerId, ProductId, WarehouseId};

/// Reference to the business document line that caused a stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Document type code (e.g. `GRN`, `DO`, `ADJ`).
    pub doc_type: String,
    /// Document identifier in the calling application.
    pub doc_id: String,
    /// Optional line identifier within the document.
    pub line_id: Option<String>,
}

impl SourceRef {
    /// Creates a header-level reference.
    pub fn new(doc_type: impl Into<String>, doc_id: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            doc_id: doc_id.into(),
            line_id: None,
        }
    }

    /// Narrows the reference to one document line.
    #[must_use]
    pub fn with_line(mut self, line_id: impl Into<String>) -> Self {
        self.line_id = Some(line_id.into());
        self
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.line_id {
            Some(line) => write!(f, "{}:{}#{}", self.doc_type, self.doc_id, line),
            None => write!(f, "{}:{}", self.doc_type, self.doc_id),
        }
    }
}

/// Kind of inbound movement that created a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundKind {
    /// Goods received against a purchase.
    PurchaseReceipt,
    /// Goods arriving from another warehouse.
    TransferIn,
    /// Stock count or manual positive adjustment.
    PositiveAdjustment,
}

/// The unit of exclusive costing: one product in one warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    /// Product.
    pub product_id: ProductId,
    /// Warehouse.
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.product_id, self.warehouse_id)
    }
}

/// One inbound batch and what is left of it.
///
/// Invariant: `0 <= quantity_remaining <= quantity_received`. Layers are
/// never deleted; an exhausted layer stays with `quantity_remaining == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLayer {
    /// Layer ID.
    pub id: LayerId,
    /// Product.
    pub product_id: ProductId,
    /// Warehouse.
    pub warehouse_id: WarehouseId,
    /// Inbound document line.
    pub source: SourceRef,
    /// Movement kind.
    pub kind: InboundKind,
    /// Arrival time; primary FIFO order.
    pub received_at: DateTime<Utc>,
    /// Creation order within the queue; FIFO tie-break.
    pub sequence: u64,
    /// Quantity received.
    pub quantity_received: Decimal,
    /// Quantity not yet consumed.
    pub quantity_remaining: Decimal,
    /// Unit cost in base currency.
    pub unit_cost_base: Decimal,
}

impl CostLayer {
    /// Quantity already consumed from this layer.
    #[must_use]
    pub fn quantity_consumed(&self) -> Decimal {
        self.quantity_received - self.quantity_remaining
    }

    /// Returns true if nothing is left to consume.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.quantity_remaining <= Decimal::ZERO
    }
}

/// Immutable record of one outbound movement drawing from one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostAllocation {
    /// Allocation ID.
    pub id: AllocationId,
    /// Product.
    pub product_id: ProductId,
    /// Warehouse.
    pub warehouse_id: WarehouseId,
    /// Outbound document line.
    pub issuing: SourceRef,
    /// Layer drawn from.
    pub layer_id: LayerId,
    /// Quantity drawn.
    pub quantity: Decimal,
    /// Layer unit cost at the time of the draw.
    pub unit_cost: Decimal,
    /// Extended amount in base currency, rounded to currency precision.
    pub amount: Decimal,
    /// When the consumption was committed.
    pub allocated_at: DateTime<Utc>,
}

/// Outcome of a successful consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionResult {
    /// Allocations created, in FIFO order.
    pub allocations: Vec<CostAllocation>,
    /// Total cost in base currency; equals the sum of allocation amounts.
    pub total_amount_base: Decimal,
}

impl ConsumptionResult {
    /// Total quantity consumed.
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.allocations.iter().map(|a| a.quantity).sum()
    }
}
