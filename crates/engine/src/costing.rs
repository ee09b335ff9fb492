//! Per-(product, warehouse) FIFO queues behind exclusive locks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use stockledger_core::costing::{
    ConsumptionResult, CostAllocation, CostLayer, CostingError, FifoQueue, InboundKind, SourceRef,
    StockKey,
};
use stockledger_shared::types::LayerId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

/// Exclusive access to one queue.
pub type QueueGuard = OwnedMutexGuard<FifoQueue>;

/// Owns every cost layer and allocation.
///
/// A queue is created on first use and its mutex serializes every read,
/// decide and write on that (product, warehouse). Different keys never
/// contend.
#[derive(Debug, Default)]
pub struct CostingEngine {
    queues: DashMap<StockKey, Arc<Mutex<FifoQueue>>>,
}

impl CostingEngine {
    /// Creates an engine with no stock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the queue for `key`.
    pub async fn lock(&self, key: StockKey) -> QueueGuard {
        // The map guard must be released before awaiting the queue lock.
        let queue = Arc::clone(
            self.queues
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(FifoQueue::new(key))))
                .value(),
        );
        queue.lock_owned().await
    }

    async fn lock_existing(&self, key: StockKey) -> Option<QueueGuard> {
        let queue = self.queues.get(&key).map(|q| Arc::clone(q.value()))?;
        Some(queue.lock_owned().await)
    }

    /// Creates a layer.
    ///
    /// # Errors
    ///
    /// Returns `CostingError::InvalidQuantity` if quantity or unit cost is
    /// not strictly positive; nothing is stored.
    pub async fn receive(
        &self,
        key: StockKey,
        source: SourceRef,
        kind: InboundKind,
        received_at: DateTime<Utc>,
        quantity: Decimal,
        unit_cost_base: Decimal,
    ) -> Result<LayerId, CostingError> {
        let mut queue = self.lock(key).await;
        let prepared = queue.prepare_layer(source, kind, received_at, quantity, unit_cost_base)?;
        let quantity = prepared.layer().quantity_received;
        let layer_id = queue.commit_layer(prepared);

        info!(
            product_id = %key.product_id,
            warehouse_id = %key.warehouse_id,
            layer_id = %layer_id,
            quantity = %quantity,
            "Cost layer created"
        );
        Ok(layer_id)
    }

    /// Issues `quantity` from the oldest layers first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` or `InsufficientStock`; no layer is
    /// decremented and no allocation recorded in either case.
    pub async fn consume(
        &self,
        key: StockKey,
        issuing: &SourceRef,
        quantity: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ConsumptionResult, CostingError> {
        let mut queue = self.lock(key).await;
        let result = queue.consume(issuing, quantity, at)?;

        info!(
            product_id = %key.product_id,
            warehouse_id = %key.warehouse_id,
            issuing = %issuing,
            quantity = %result.quantity(),
            layers = result.allocations.len(),
            amount = %result.total_amount_base,
            "Inventory consumed"
        );
        Ok(result)
    }

    /// All layers for `key` in FIFO order, exhausted ones included.
    pub async fn layers(&self, key: StockKey) -> Vec<CostLayer> {
        match self.lock_existing(key).await {
            Some(queue) => queue.layers().to_vec(),
            None => Vec::new(),
        }
    }

    /// All allocations drawn from `key`, in commit order.
    pub async fn allocations(&self, key: StockKey) -> Vec<CostAllocation> {
        match self.lock_existing(key).await {
            Some(queue) => queue.allocations().to_vec(),
            None => Vec::new(),
        }
    }

    /// Quantity on hand for `key`.
    pub async fn on_hand(&self, key: StockKey) -> Decimal {
        match self.lock_existing(key).await {
            Some(queue) => queue.on_hand(),
            None => Decimal::ZERO,
        }
    }

    /// Remaining quantity valued at layer cost.
    ///
    /// # Errors
    ///
    /// Returns `CostingError::AmountOverflow` if the value does not fit.
    pub async fn valuation(&self, key: StockKey) -> Result<Decimal, CostingError> {
        match self.lock_existing(key).await {
            Some(queue) => queue.valuation(),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Checks layer and allocation invariants across every queue.
    pub async fn is_consistent(&self) -> bool {
        let queues: Vec<_> = self.queues.iter().map(|q| Arc::clone(q.value())).collect();
        for queue in queues {
            if !queue.lock().await.is_consistent() {
                return false;
            }
        }
        true
    }
}
