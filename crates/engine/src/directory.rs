//! Master data lookups supplied by the surrounding application.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use stockledger_shared::types::{AccountId, CurrencyCode};

/// Account existence lookup.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Returns true if the account exists.
    async fn account_exists(&self, account_id: AccountId) -> bool;
}

/// Currency existence and active-state lookup.
#[async_trait]
pub trait CurrencyDirectory: Send + Sync {
    /// `None` if unknown, otherwise whether the currency is active.
    async fn currency_status(&self, code: &CurrencyCode) -> Option<bool>;
}

/// In-memory master data for tests and the simulator.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: DashSet<AccountId>,
    currencies: DashMap<CurrencyCode, bool>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account.
    pub fn add_account(&self, account_id: AccountId) {
        self.accounts.insert(account_id);
    }

    /// Registers or updates a currency.
    pub fn set_currency(&self, code: CurrencyCode, active: bool) {
        self.currencies.insert(code, active);
    }
}

#[async_trait]
impl AccountDirectory for InMemoryDirectory {
    async fn account_exists(&self, account_id: AccountId) -> bool {
        self.accounts.contains(&account_id)
    }
}

#[async_trait]
impl CurrencyDirectory for InMemoryDirectory {
    async fn currency_status(&self, code: &CurrencyCode) -> Option<bool> {
        self.currencies.get(code).map(|active| *active)
    }
}
