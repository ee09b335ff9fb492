//! Strict FIFO cost layer queue for one product in one warehouse.
//!
//! The queue itself is not synchronized. Callers own it exclusively for the
//! whole read-decide-write cycle (the engine keeps one behind a per-key
//! mutex). Consumption is split in two steps:
//!
//! 1. [`FifoQueue::plan`] walks the layers and computes every draw without
//!    touching state. All failures surface here.
//! 2. [`FifoQueue::apply`] commits a plan. It only fails if the queue moved
//!    since the plan was taken, and then changes nothing.
//!
//! This keeps consumption all-or-nothing: a shortfall discovered on the last
//! layer leaves every earlier layer untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use stockledger_shared::types::{AllocationId, LayerId};

use super::error::CostingError;
use super::types::{
    ConsumptionResult, CostAllocation, CostLayer, InboundKind, SourceRef, StockKey,
};
use crate::currency::{QUANTITY_EPSILON, reconcile_to_total, round_amount, round_quantity};

/// A validated layer waiting to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLayer {
    layer: CostLayer,
}

impl PreparedLayer {
    /// The layer as it will be stored (sequence is assigned on commit).
    #[must_use]
    pub const fn layer(&self) -> &CostLayer {
        &self.layer
    }
}

/// A fully computed consumption that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionPlan {
    key: StockKey,
    version: u64,
    allocations: Vec<CostAllocation>,
    total_amount_base: Decimal,
}

impl ConsumptionPlan {
    /// Planned allocations in FIFO order.
    #[must_use]
    pub fn allocations(&self) -> &[CostAllocation] {
        &self.allocations
    }

    /// Total cost of the plan in base currency.
    #[must_use]
    pub const fn total_amount_base(&self) -> Decimal {
        self.total_amount_base
    }
}

/// Cost layers and allocation history of one [`StockKey`].
///
/// A layer is only admitted if the queue's on-hand quantity and remaining
/// value stay representable, so every later draw can be extended without
/// overflow.
#[derive(Debug, Clone)]
pub struct FifoQueue {
    key: StockKey,
    /// Sorted by `(received_at, sequence)`.
    layers: Vec<CostLayer>,
    allocations: Vec<CostAllocation>,
    next_sequence: u64,
    version: u64,
}

impl FifoQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new(key: StockKey) -> Self {
        Self {
            key,
            layers: Vec::new(),
            allocations: Vec::new(),
            next_sequence: 1,
            version: 0,
        }
    }

    /// The product and warehouse this queue costs.
    #[must_use]
    pub const fn key(&self) -> StockKey {
        self.key
    }

    /// All layers in FIFO order, exhausted ones included.
    #[must_use]
    pub fn layers(&self) -> &[CostLayer] {
        &self.layers
    }

    /// All allocations in commit order.
    #[must_use]
    pub fn allocations(&self) -> &[CostAllocation] {
        &self.allocations
    }

    /// Quantity still available.
    #[must_use]
    pub fn on_hand(&self) -> Decimal {
        self.layers.iter().map(|l| l.quantity_remaining).sum()
    }

    /// Value of the remaining stock in base currency.
    ///
    /// # Errors
    ///
    /// Returns `CostingError::AmountOverflow` if the value does not fit.
    pub fn valuation(&self) -> Result<Decimal, CostingError> {
        self.remaining_value()
            .map(round_amount)
            .ok_or_else(|| self.overflow())
    }

    fn remaining_value(&self) -> Option<Decimal> {
        self.layers.iter().try_fold(Decimal::ZERO, |total, layer| {
            layer
                .quantity_remaining
                .checked_mul(layer.unit_cost_base)
                .and_then(|value| total.checked_add(value))
        })
    }

    fn overflow(&self) -> CostingError {
        CostingError::AmountOverflow {
            product_id: self.key.product_id,
            warehouse_id: self.key.warehouse_id,
        }
    }

    /// Validates a new inbound layer.
    ///
    /// Quantity is normalized to 4 decimal places. Unit cost is stored as
    /// given.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if quantity (after normalization) or unit cost is
    ///   not strictly positive
    /// - `AmountOverflow` if the layer's value, or the queue's totals with
    ///   it, would not fit in a `Decimal`
    pub fn prepare_layer(
        &self,
        source: SourceRef,
        kind: InboundKind,
        received_at: DateTime<Utc>,
        quantity: Decimal,
        unit_cost_base: Decimal,
    ) -> Result<PreparedLayer, CostingError> {
        let quantity = positive("quantity", quantity, round_quantity(quantity))?;
        let unit_cost_base = positive("unit_cost_base", unit_cost_base, unit_cost_base)?;

        let in_range = quantity
            .checked_mul(unit_cost_base)
            .zip(self.remaining_value())
            .and_then(|(value, total)| total.checked_add(value))
            .and_then(|_| self.on_hand().checked_add(quantity))
            .is_some();
        if !in_range {
            return Err(self.overflow());
        }

        Ok(PreparedLayer {
            layer: CostLayer {
                id: LayerId::new(),
                product_id: self.key.product_id,
                warehouse_id: self.key.warehouse_id,
                source,
                kind,
                received_at,
                sequence: 0,
                quantity_received: quantity,
                quantity_remaining: quantity,
                unit_cost_base,
            },
        })
    }

    /// Stores a prepared layer at its FIFO position.
    pub fn commit_layer(&mut self, prepared: PreparedLayer) -> LayerId {
        let mut layer = prepared.layer;
        layer.sequence = self.next_sequence;
        self.next_sequence += 1;

        // Equal timestamps keep creation order: insert after them.
        let position = self
            .layers
            .partition_point(|l| l.received_at <= layer.received_at);
        let id = layer.id;
        self.layers.insert(position, layer);
        self.version += 1;
        id
    }

    /// Creates a layer in one step.
    ///
    /// # Errors
    ///
    /// See [`FifoQueue::prepare_layer`].
    pub fn receive(
        &mut self,
        source: SourceRef,
        kind: InboundKind,
        received_at: DateTime<Utc>,
        quantity: Decimal,
        unit_cost_base: Decimal,
    ) -> Result<LayerId, CostingError> {
        let prepared = self.prepare_layer(source, kind, received_at, quantity, unit_cost_base)?;
        Ok(self.commit_layer(prepared))
    }

    /// Computes the draws needed to issue `quantity` without changing state.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is not strictly positive
    /// - `InsufficientStock` if the layers run out, naming the shortfall
    /// - `AmountOverflow` if the drawn cost does not fit in a `Decimal`
    pub fn plan(
        &self,
        issuing: &SourceRef,
        quantity: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ConsumptionPlan, CostingError> {
        let requested = positive("quantity", quantity, round_quantity(quantity))?;

        let mut needed = requested;
        let mut draws: Vec<(&CostLayer, Decimal)> = Vec::new();
        for layer in self.layers.iter().filter(|l| !l.is_exhausted()) {
            if needed <= QUANTITY_EPSILON {
                break;
            }
            let take = needed.min(layer.quantity_remaining);
            draws.push((layer, take));
            needed -= take;
        }

        if needed > QUANTITY_EPSILON {
            return Err(CostingError::InsufficientStock {
                product_id: self.key.product_id,
                warehouse_id: self.key.warehouse_id,
                requested,
                available: requested - needed,
                missing: needed,
            });
        }

        let exact: Vec<Decimal> = draws
            .iter()
            .map(|(layer, take)| take.checked_mul(layer.unit_cost_base))
            .collect::<Option<_>>()
            .ok_or_else(|| self.overflow())?;
        exact
            .iter()
            .try_fold(Decimal::ZERO, |total, e| total.checked_add(*e))
            .ok_or_else(|| self.overflow())?;
        let mut amounts: Vec<Decimal> = exact.iter().map(|e| round_amount(*e)).collect();
        let total_amount_base = reconcile_to_total(&exact, &mut amounts);

        let allocations = draws
            .iter()
            .zip(amounts)
            .map(|((layer, take), amount)| CostAllocation {
                id: AllocationId::new(),
                product_id: self.key.product_id,
                warehouse_id: self.key.warehouse_id,
                issuing: issuing.clone(),
                layer_id: layer.id,
                quantity: *take,
                unit_cost: layer.unit_cost_base,
                amount,
                allocated_at: at,
            })
            .collect();

        Ok(ConsumptionPlan {
            key: self.key,
            version: self.version,
            allocations,
            total_amount_base,
        })
    }

    /// Commits a plan taken from this queue.
    ///
    /// # Errors
    ///
    /// Returns `CostingError::StalePlan` without changing anything if the
    /// queue was modified after the plan was computed, or if the plan was
    /// taken from another queue.
    pub fn apply(&mut self, plan: ConsumptionPlan) -> Result<ConsumptionResult, CostingError> {
        if plan.key != self.key || plan.version != self.version {
            return Err(CostingError::StalePlan {
                product_id: self.key.product_id,
                warehouse_id: self.key.warehouse_id,
            });
        }

        for allocation in &plan.allocations {
            if let Some(layer) = self.layers.iter_mut().find(|l| l.id == allocation.layer_id) {
                layer.quantity_remaining -= allocation.quantity;
            }
        }
        self.allocations.extend(plan.allocations.iter().cloned());
        self.version += 1;

        Ok(ConsumptionResult {
            allocations: plan.allocations,
            total_amount_base: plan.total_amount_base,
        })
    }

    /// Plans and applies a consumption in one step.
    ///
    /// # Errors
    ///
    /// See [`FifoQueue::plan`].
    pub fn consume(
        &mut self,
        issuing: &SourceRef,
        quantity: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ConsumptionResult, CostingError> {
        let plan = self.plan(issuing, quantity, at)?;
        self.apply(plan)
    }

    /// Checks the layer and allocation invariants.
    ///
    /// Every layer satisfies `0 <= remaining <= received`, and what was
    /// consumed from it equals the sum of its allocations.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.layers.iter().all(|layer| {
            let allocated: Decimal = self
                .allocations
                .iter()
                .filter(|a| a.layer_id == layer.id)
                .map(|a| a.quantity)
                .sum();
            layer.quantity_remaining >= Decimal::ZERO
                && layer.quantity_remaining <= layer.quantity_received
                && layer.quantity_consumed() == allocated
        })
    }
}

/// Returns `normalized` if it is strictly positive; errors name the raw `value`.
fn positive(
    field: &'static str,
    value: Decimal,
    normalized: Decimal,
) -> Result<Decimal, CostingError> {
    if normalized <= Decimal::ZERO {
        return Err(CostingError::InvalidQuantity { field, value });
    }
    Ok(normalized)
}
