//! Inventory movements and the goods receipt / shipment postings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stockledger_core::costing::{
    ConsumptionResult, CostAllocation, CostLayer, CostingError, InboundKind, SourceRef, StockKey,
};
use stockledger_core::currency::extend;
use stockledger_core::fiscal::Actor;
use stockledger_core::ledger::{
    JournalEntry, JournalHeader, JournalLineInput, LedgerService, Side, SourceDocument,
};
use stockledger_shared::types::{AccountId, CurrencyCode, LayerId, Money, ProductId, WarehouseId};
use tracing::info;

use super::{StockLedger, permit_payload};
use crate::error::EngineResult;

/// A raw inbound movement with its cost already in base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMovement {
    /// Product.
    pub product_id: ProductId,
    /// Warehouse.
    pub warehouse_id: WarehouseId,
    /// Inbound document line.
    pub source: SourceRef,
    /// Movement kind.
    pub kind: InboundKind,
    /// Arrival time.
    pub received_at: DateTime<Utc>,
    /// Quantity received.
    pub quantity: Decimal,
    /// Unit cost in base currency.
    pub unit_cost_base: Decimal,
}

/// A goods receipt to cost and post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRequest {
    /// Product.
    pub product_id: ProductId,
    /// Warehouse.
    pub warehouse_id: WarehouseId,
    /// Receipt document line.
    pub source: SourceRef,
    /// Movement kind.
    pub kind: InboundKind,
    /// Accounting date; also the day of the exchange rate.
    pub document_date: NaiveDate,
    /// Arrival time.
    pub received_at: DateTime<Utc>,
    /// Quantity received.
    pub quantity: Decimal,
    /// Unit cost in `currency`.
    pub unit_cost: Decimal,
    /// Currency of the unit cost.
    pub currency: CurrencyCode,
    /// Debited with the receipt value.
    pub inventory_account: AccountId,
    /// Credited with the receipt value (goods received not invoiced).
    pub clearing_account: AccountId,
    /// Justification when the actor overrides the posting lock.
    #[serde(default)]
    pub override_reason: Option<String>,
}

/// Result of [`StockLedger::receive_goods`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceipt {
    /// Layer created.
    pub layer_id: LayerId,
    /// Unit cost stored on the layer.
    pub unit_cost_base: Decimal,
    /// Posted journal.
    pub journal: JournalEntry,
}

/// A goods shipment to cost and post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    /// Product.
    pub product_id: ProductId,
    /// Warehouse.
    pub warehouse_id: WarehouseId,
    /// Shipment document line.
    pub issuing: SourceRef,
    /// Accounting date.
    pub document_date: NaiveDate,
    /// Time of issue.
    pub shipped_at: DateTime<Utc>,
    /// Quantity shipped.
    pub quantity: Decimal,
    /// Debited with the cost of goods sold.
    pub cogs_account: AccountId,
    /// Credited with the cost of goods sold.
    pub inventory_account: AccountId,
    /// Justification when the actor overrides the posting lock.
    #[serde(default)]
    pub override_reason: Option<String>,
}

/// Result of [`StockLedger::ship_goods`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsShipment {
    /// Layers drawn from.
    pub consumption: ConsumptionResult,
    /// Posted journal; `None` when the consumed cost is zero.
    pub journal: Option<JournalEntry>,
}

impl StockLedger {
    /// Creates a cost layer. No journal is posted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` if quantity or unit cost is not positive.
    pub async fn receive_inventory(&self, movement: InboundMovement) -> EngineResult<LayerId> {
        let key = StockKey::new(movement.product_id, movement.warehouse_id);
        Ok(self
            .costing
            .receive(
                key,
                movement.source,
                movement.kind,
                movement.received_at,
                movement.quantity,
                movement.unit_cost_base,
            )
            .await?)
    }

    /// Issues stock oldest layer first. No journal is posted.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` or `InsufficientStock`; nothing is consumed.
    pub async fn consume_inventory(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        issuing: &SourceRef,
        quantity: Decimal,
    ) -> EngineResult<ConsumptionResult> {
        let key = StockKey::new(product_id, warehouse_id);
        Ok(self
            .costing
            .consume(key, issuing, quantity, Utc::now())
            .await?)
    }

    /// Receives goods and posts debit inventory / credit clearing at the
    /// base-currency value, as one unit.
    ///
    /// The unit cost is converted at the rate of the document date and kept
    /// at full precision; only the posted amount is rounded. Either the
    /// layer, the journal and its number all exist afterwards, or none of
    /// them do.
    ///
    /// # Errors
    ///
    /// `PostingLocked`, `PeriodClosed`, `MissingRate`, `InvalidQuantity`,
    /// `AmountOverflow`, `InvalidLine` or `NumberingError`.
    pub async fn receive_goods(
        &self,
        actor: &Actor,
        request: ReceiptRequest,
    ) -> EngineResult<GoodsReceipt> {
        let permit = self.guard(
            actor,
            request.document_date,
            &format!("goods receipt {}", request.source),
            request.override_reason.as_deref(),
        )?;

        let base = self.base_currency().clone();
        let rate = self
            .rates
            .resolve(&request.currency, &base, request.document_date)?
            .rate;
        let stock_key = StockKey::new(request.product_id, request.warehouse_id);
        let overflow = || CostingError::AmountOverflow {
            product_id: request.product_id,
            warehouse_id: request.warehouse_id,
        };
        let unit_cost_base = request.unit_cost.checked_mul(rate).ok_or_else(overflow)?;

        let mut queue = self.costing.lock(stock_key).await;
        let prepared = queue.prepare_layer(
            request.source.clone(),
            request.kind,
            request.received_at,
            request.quantity,
            unit_cost_base,
        )?;
        let quantity = prepared.layer().quantity_received;
        let amount = extend(quantity, prepared.layer().unit_cost_base).ok_or_else(overflow)?;
        let money = if request.currency == base {
            Money::base(amount, base.clone())
        } else {
            let original = extend(quantity, request.unit_cost).ok_or_else(overflow)?;
            Money::converted(amount, request.currency.clone(), original)
        };
        let memo = format!("Receipt {} x {}", quantity, request.source);
        let lines = vec![
            JournalLineInput::from_money(request.inventory_account, Side::Debit, &money, &base)
                .with_description(memo.clone()),
            JournalLineInput::from_money(request.clearing_account, Side::Credit, &money, &base)
                .with_description(memo),
        ];
        self.validate(&lines).await?;
        let journal_key = self.journal_key(request.document_date)?;
        let header = JournalHeader {
            document_date: request.document_date,
            description: format!("Goods receipt {}", request.source),
            source: Some(SourceDocument::new(
                request.source.doc_type.clone(),
                request.source.doc_id.clone(),
            )),
            reverses: None,
        };
        let now = Utc::now();
        let mut journal = LedgerService::build_draft(header, lines, actor.id, now);

        let mut book = self.journals.write().await;
        let layer_id = queue.commit_layer(prepared);
        let number = self.sequences.next(&journal_key);
        LedgerService::mark_posted(&mut journal, number.to_string(), actor.id, now)?;
        book.insert(journal.clone());
        drop(book);
        drop(queue);

        info!(
            actor = %actor.id,
            product_id = %request.product_id,
            warehouse_id = %request.warehouse_id,
            layer_id = %layer_id,
            quantity = %quantity,
            unit_cost_base = %unit_cost_base,
            document_number = %number,
            "Goods received"
        );
        self.record(
            actor,
            "goods.received",
            &number,
            json!({
                "layer_id": layer_id,
                "quantity": quantity,
                "amount": amount,
                "override": permit_payload(&permit),
            }),
        );
        Ok(GoodsReceipt {
            layer_id,
            unit_cost_base,
            journal,
        })
    }

    /// Ships goods FIFO and posts debit cost of goods sold / credit
    /// inventory at the consumed base amount, as one unit.
    ///
    /// The consumption is planned under the stock lock and only applied
    /// after the journal has validated, so a failure anywhere leaves the
    /// layers untouched and uses no number.
    ///
    /// # Errors
    ///
    /// `PostingLocked`, `PeriodClosed`, `InvalidQuantity`,
    /// `InsufficientStock`, `AmountOverflow`, `InvalidLine` or
    /// `NumberingError`.
    pub async fn ship_goods(
        &self,
        actor: &Actor,
        request: ShipmentRequest,
    ) -> EngineResult<GoodsShipment> {
        let permit = self.guard(
            actor,
            request.document_date,
            &format!("goods shipment {}", request.issuing),
            request.override_reason.as_deref(),
        )?;
        let stock_key = StockKey::new(request.product_id, request.warehouse_id);

        let mut queue = self.costing.lock(stock_key).await;
        let plan = queue.plan(&request.issuing, request.quantity, request.shipped_at)?;
        let total = plan.total_amount_base();

        let pending = if total > Decimal::ZERO {
            let base = self.base_currency().clone();
            let memo = format!("Cost of {}", request.issuing);
            let lines = vec![
                JournalLineInput::debit(request.cogs_account, total, base.clone())
                    .with_description(memo.clone()),
                JournalLineInput::credit(request.inventory_account, total, base)
                    .with_description(memo),
            ];
            self.validate(&lines).await?;
            let header = JournalHeader {
                document_date: request.document_date,
                description: format!("Goods shipment {}", request.issuing),
                source: Some(SourceDocument::new(
                    request.issuing.doc_type.clone(),
                    request.issuing.doc_id.clone(),
                )),
                reverses: None,
            };
            Some((
                self.journal_key(request.document_date)?,
                LedgerService::build_draft(header, lines, actor.id, Utc::now()),
            ))
        } else {
            None
        };

        let mut book = self.journals.write().await;
        let consumption = queue.apply(plan)?;
        let journal = match pending {
            Some((journal_key, mut journal)) => {
                let number = self.sequences.next(&journal_key);
                LedgerService::mark_posted(&mut journal, number.to_string(), actor.id, Utc::now())?;
                book.insert(journal.clone());
                Some(journal)
            }
            None => None,
        };
        drop(book);
        drop(queue);

        let document_number = journal.as_ref().and_then(|j| j.document_number.clone());
        info!(
            actor = %actor.id,
            product_id = %request.product_id,
            warehouse_id = %request.warehouse_id,
            quantity = %consumption.quantity(),
            amount = %consumption.total_amount_base,
            document_number = document_number.as_deref().unwrap_or("-"),
            "Goods shipped"
        );
        self.record(
            actor,
            "goods.shipped",
            &request.issuing,
            json!({
                "document_number": document_number,
                "quantity": consumption.quantity(),
                "amount": consumption.total_amount_base,
                "layers": consumption.allocations.len(),
                "override": permit_payload(&permit),
            }),
        );
        Ok(GoodsShipment {
            consumption,
            journal,
        })
    }

    /// Layers for a product in a warehouse, FIFO order.
    pub async fn layers(&self, product_id: ProductId, warehouse_id: WarehouseId) -> Vec<CostLayer> {
        self.costing
            .layers(StockKey::new(product_id, warehouse_id))
            .await
    }

    /// Allocations drawn from a product in a warehouse.
    pub async fn allocations_for(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Vec<CostAllocation> {
        self.costing
            .allocations(StockKey::new(product_id, warehouse_id))
            .await
    }

    /// Quantity on hand.
    pub async fn on_hand(&self, product_id: ProductId, warehouse_id: WarehouseId) -> Decimal {
        self.costing
            .on_hand(StockKey::new(product_id, warehouse_id))
            .await
    }

    /// Remaining stock valued at layer cost.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the value does not fit in a `Decimal`.
    pub async fn valuation(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> EngineResult<Decimal> {
        Ok(self
            .costing
            .valuation(StockKey::new(product_id, warehouse_id))
            .await?)
    }
}
