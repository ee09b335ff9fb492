//! Stockledger simulator.
//!
//! Seeds currencies, accounts and rates into an in-memory engine, then runs
//! one business day: two receipts (one in a foreign currency), a FIFO
//! shipment, a sale, a manual draft and a reversal. Prints the resulting
//! documents and the trial balance.
//!
//! Usage: cargo run --bin simulator

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal_macros::dec;
use stockledger_core::costing::{InboundKind, SourceRef};
use stockledger_core::currency::RateSource;
use stockledger_core::fiscal::{Actor, Capability, FiscalPeriod};
use stockledger_core::ledger::{JournalEntry, JournalLineInput, SourceDocument};
use stockledger_engine::{
    DraftJournal, InMemoryDirectory, IntegrationJournal, LedgerSettings, RateInput,
    ReceiptRequest, ShipmentRequest, StockLedger, TracingAuditSink,
};
use stockledger_shared::types::{AccountId, ActorId, CurrencyCode, ProductId, WarehouseId};
use stockledger_shared::{AppConfig, LoggingConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

struct Chart {
    inventory: AccountId,
    grni: AccountId,
    cogs: AccountId,
    cash: AccountId,
    revenue: AccountId,
    rent: AccountId,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let settings = LedgerSettings::from_config(&config)?;
    let today = settings.clock.today();
    let base = settings.base_currency.clone();
    let foreign = foreign_currency(&base)?;
    info!(base = %base, foreign = %foreign, day = %today, "Starting simulation");

    let directory = Arc::new(InMemoryDirectory::new());
    directory.set_currency(base.clone(), true);
    directory.set_currency(foreign.clone(), true);
    let chart = Chart {
        inventory: AccountId::new(),
        grni: AccountId::new(),
        cogs: AccountId::new(),
        cash: AccountId::new(),
        revenue: AccountId::new(),
        rent: AccountId::new(),
    };
    for id in [
        chart.inventory,
        chart.grni,
        chart.cogs,
        chart.cash,
        chart.revenue,
        chart.rent,
    ] {
        directory.add_account(id);
    }

    let ledger = StockLedger::new(
        settings,
        directory.clone(),
        directory,
        Arc::new(TracingAuditSink),
    );
    let clerk = Actor::new(ActorId::new());
    let controller = Actor::new(ActorId::new()).with_capability(Capability::PostingOverride);

    ledger.upsert_period(&controller, current_month(today)?)?;
    ledger
        .upsert_rate(
            &controller,
            RateInput {
                from_currency: foreign.clone(),
                to_currency: base.clone(),
                day: today,
                rate: dec!(1.0850),
                source: RateSource::Manual,
                source_reference: Some("simulator".to_string()),
            },
        )
        .await?;

    let product = ProductId::new();
    let warehouse = WarehouseId::new();
    let now = Utc::now();
    let mut documents: Vec<JournalEntry> = Vec::new();

    for (doc, offset, quantity, unit_cost, currency) in [
        ("GRN-1", 2, dec!(10), dec!(5.00), base.clone()),
        ("GRN-2", 1, dec!(8), dec!(6.40), foreign.clone()),
    ] {
        let receipt = ledger
            .receive_goods(
                &clerk,
                ReceiptRequest {
                    product_id: product,
                    warehouse_id: warehouse,
                    source: SourceRef::new("GRN", doc),
                    kind: InboundKind::PurchaseReceipt,
                    document_date: today,
                    received_at: now - Duration::hours(offset),
                    quantity,
                    unit_cost,
                    currency,
                    inventory_account: chart.inventory,
                    clearing_account: chart.grni,
                    override_reason: None,
                },
            )
            .await?;
        documents.push(receipt.journal);
    }

    let shipment = ledger
        .ship_goods(
            &clerk,
            ShipmentRequest {
                product_id: product,
                warehouse_id: warehouse,
                issuing: SourceRef::new("DO", "DO-1").with_line("1"),
                document_date: today,
                shipped_at: now,
                quantity: dec!(12),
                cogs_account: chart.cogs,
                inventory_account: chart.inventory,
                override_reason: None,
            },
        )
        .await?;
    for allocation in &shipment.consumption.allocations {
        info!(
            layer_id = %allocation.layer_id,
            quantity = %allocation.quantity,
            unit_cost = %allocation.unit_cost,
            amount = %allocation.amount,
            "FIFO draw"
        );
    }
    documents.extend(shipment.journal);

    let sale = ledger
        .post_integration_journal(
            &clerk,
            IntegrationJournal {
                document_date: today,
                description: "Sale DO-1".to_string(),
                source: SourceDocument::new("invoice", "INV-1"),
                lines: vec![
                    JournalLineInput::debit(chart.cash, dec!(150.00), base.clone()),
                    JournalLineInput::credit(chart.revenue, dec!(150.00), base.clone()),
                ],
                override_reason: None,
            },
        )
        .await?;
    documents.push(sale.clone());

    let draft = ledger
        .create_draft_journal(
            &clerk,
            DraftJournal {
                document_date: today,
                description: "Warehouse rent".to_string(),
                source: None,
                lines: vec![
                    JournalLineInput::debit(chart.rent, dec!(40.00), base.clone()),
                    JournalLineInput::credit(chart.cash, dec!(40.00), base.clone()),
                ],
            },
        )
        .await?;
    documents.push(ledger.post_draft_journal(&controller, draft.id, None).await?);
    documents.push(
        ledger
            .reverse_journal(&controller, sale.id, today, "Invoice issued to wrong customer")
            .await?,
    );

    println!("Documents:");
    for entry in &documents {
        println!("{}", serde_json::to_string_pretty(entry)?);
    }

    let trial = ledger.trial_balance().await;
    println!("Trial balance:");
    println!("{}", serde_json::to_string_pretty(&trial)?);
    let valuation = ledger.valuation(product, warehouse).await?;
    println!(
        "On hand: {}  Valuation: {} {}",
        ledger.on_hand(product, warehouse).await,
        valuation,
        base
    );

    anyhow::ensure!(ledger.is_consistent().await, "Ledger is inconsistent");
    info!(documents = documents.len(), "Simulation complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn foreign_currency(base: &CurrencyCode) -> anyhow::Result<CurrencyCode> {
    let code = if base.as_str() == "EUR" { "USD" } else { "EUR" };
    Ok(CurrencyCode::new(code)?)
}

fn current_month(today: NaiveDate) -> anyhow::Result<FiscalPeriod> {
    let start = today.with_day(1).context("First day of month out of range")?;
    let next = start
        .checked_add_months(Months::new(1))
        .context("Next month out of range")?;
    let end = next.pred_opt().context("Last day of month out of range")?;
    Ok(FiscalPeriod::open(start.format("%Y-%m").to_string(), start, end))
}
