//! Shared fixture for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use stockledger_core::costing::{InboundKind, SourceRef};
use stockledger_core::fiscal::{Actor, Capability};
use stockledger_core::ledger::{JournalLineInput, SourceDocument};
use stockledger_core::currency::RateSource;
use stockledger_engine::{
    AccountDirectory, InMemoryDirectory, InboundMovement, IntegrationJournal, LedgerSettings, MemoryAuditSink,
    RateInput, StockLedger,
};
use stockledger_shared::types::{AccountId, ActorId, CurrencyCode, ProductId, WarehouseId};

/// Chart of accounts used by the tests.
pub struct Accounts {
    pub inventory: AccountId,
    pub clearing: AccountId,
    pub cogs: AccountId,
    pub cash: AccountId,
    pub revenue: AccountId,
    pub tax: AccountId,
}

pub struct Fixture {
    pub ledger: Arc<StockLedger>,
    pub directory: Arc<InMemoryDirectory>,
    pub audit: Arc<MemoryAuditSink>,
    pub accounts: Accounts,
    pub clerk: Actor,
    pub controller: Actor,
}

pub fn code(s: &str) -> CurrencyCode {
    CurrencyCode::new(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day() -> NaiveDate {
    date(2024, 5, 2)
}

pub fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap() + Duration::hours(hour)
}

/// Account directory that answers every lookup after `delay`.
pub struct SlowAccounts {
    inner: Arc<InMemoryDirectory>,
    delay: StdDuration,
}

#[async_trait]
impl AccountDirectory for SlowAccounts {
    async fn account_exists(&self, id: AccountId) -> bool {
        tokio::time::sleep(self.delay).await;
        self.inner.account_exists(id).await
    }
}

impl Fixture {
    /// Engine with base currency `base` and TRY, USD, EUR active.
    pub fn with_base(base: &str) -> Self {
        Self::build(base, None)
    }

    /// USD engine whose account lookups each take `delay`.
    pub fn with_slow_accounts(delay: StdDuration) -> Self {
        Self::build("USD", Some(delay))
    }

    fn build(base: &str, account_delay: Option<StdDuration>) -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        for c in ["TRY", "USD", "EUR"] {
            directory.set_currency(code(c), true);
        }

        let accounts = Accounts {
            inventory: AccountId::new(),
            clearing: AccountId::new(),
            cogs: AccountId::new(),
            cash: AccountId::new(),
            revenue: AccountId::new(),
            tax: AccountId::new(),
        };
        for id in [
            accounts.inventory,
            accounts.clearing,
            accounts.cogs,
            accounts.cash,
            accounts.revenue,
            accounts.tax,
        ] {
            directory.add_account(id);
        }

        let account_directory: Arc<dyn AccountDirectory> = match account_delay {
            Some(delay) => Arc::new(SlowAccounts {
                inner: directory.clone(),
                delay,
            }),
            None => directory.clone(),
        };
        let audit = Arc::new(MemoryAuditSink::new());
        let ledger = Arc::new(StockLedger::new(
            LedgerSettings::new(code(base)),
            account_directory,
            directory.clone(),
            audit.clone(),
        ));

        Self {
            ledger,
            directory,
            audit,
            accounts,
            clerk: Actor::new(ActorId::new()),
            controller: Actor::new(ActorId::new()).with_capability(Capability::PostingOverride),
        }
    }

    pub fn new() -> Self {
        Self::with_base("USD")
    }

    pub async fn rate(&self, from: &str, to: &str, rate: Decimal) {
        self.ledger
            .upsert_rate(
                &self.clerk,
                RateInput {
                    from_currency: code(from),
                    to_currency: code(to),
                    day: day(),
                    rate,
                    source: RateSource::Manual,
                    source_reference: None,
                },
            )
            .await
            .unwrap();
    }

    pub async fn stock(
        &self,
        product: ProductId,
        warehouse: WarehouseId,
        doc: &str,
        received_at: DateTime<Utc>,
        quantity: Decimal,
        unit_cost: Decimal,
    ) {
        self.ledger
            .receive_inventory(InboundMovement {
                product_id: product,
                warehouse_id: warehouse,
                source: SourceRef::new("GRN", doc),
                kind: InboundKind::PurchaseReceipt,
                received_at,
                quantity,
                unit_cost_base: unit_cost,
            })
            .await
            .unwrap();
    }

    pub fn journal(&self, doc_id: &str, lines: Vec<JournalLineInput>) -> IntegrationJournal {
        IntegrationJournal {
            document_date: day(),
            description: format!("Invoice {doc_id}"),
            source: SourceDocument::new("invoice", doc_id),
            lines,
            override_reason: None,
        }
    }

    pub fn base(&self) -> CurrencyCode {
        self.ledger.base_currency().clone()
    }
}
