//! Journal entry storage.

use std::collections::HashMap;

use stockledger_core::ledger::{JournalEntry, LedgerError, LedgerService, SourceDocument};
use stockledger_shared::types::JournalEntryId;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// All journal entries with their lookup indexes.
///
/// Header and lines are one value, so an entry is always stored or
/// replaced whole and readers never see a header without its lines.
#[derive(Debug, Default)]
pub struct JournalBook {
    entries: HashMap<JournalEntryId, JournalEntry>,
    order: Vec<JournalEntryId>,
    by_source: HashMap<SourceDocument, Vec<JournalEntryId>>,
    reversals: HashMap<JournalEntryId, JournalEntryId>,
}

impl JournalBook {
    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, id: JournalEntryId) -> Option<&JournalEntry> {
        self.entries.get(&id)
    }

    /// Looks up an entry or fails with `EntryNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::EntryNotFound`.
    pub fn require(&self, id: JournalEntryId) -> Result<&JournalEntry, LedgerError> {
        self.get(id).ok_or(LedgerError::EntryNotFound(id))
    }

    /// The entry reversing `id`, if one was posted.
    #[must_use]
    pub fn reversal_of(&self, id: JournalEntryId) -> Option<JournalEntryId> {
        self.reversals.get(&id).copied()
    }

    /// Entries created for a source document, oldest first.
    #[must_use]
    pub fn for_source(&self, source: &SourceDocument) -> Vec<&JournalEntry> {
        self.by_source
            .get(source)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id))
            .collect()
    }

    /// Every entry in creation order.
    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores a new entry.
    pub(crate) fn insert(&mut self, entry: JournalEntry) {
        if let Some(source) = &entry.source {
            self.by_source
                .entry(source.clone())
                .or_default()
                .push(entry.id);
        }
        if let (Some(original), true) = (entry.reverses, entry.is_posted()) {
            self.reversals.insert(original, entry.id);
        }
        self.order.push(entry.id);
        self.entries.insert(entry.id, entry);
    }

    /// Replaces a stored draft with its posted form.
    pub(crate) fn replace(&mut self, entry: JournalEntry) {
        if let (Some(original), true) = (entry.reverses, entry.is_posted()) {
            self.reversals.insert(original, entry.id);
        }
        self.entries.insert(entry.id, entry);
    }

    /// Removes a draft.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, or `InvalidState` if the entry is posted.
    pub(crate) fn remove_draft(&mut self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        LedgerService::ensure_draft(self.require(id)?, "cancel")?;
        let entry = self
            .entries
            .remove(&id)
            .ok_or(LedgerError::EntryNotFound(id))?;
        self.order.retain(|e| *e != id);
        if let Some(source) = &entry.source {
            if let Some(ids) = self.by_source.get_mut(source) {
                ids.retain(|e| *e != id);
            }
        }
        Ok(entry)
    }
}

/// Lock around the [`JournalBook`].
///
/// Writers hold the write guard from their final checks through the
/// insert, which makes number allocation and storage one unit.
#[derive(Debug, Default)]
pub struct JournalStore {
    book: RwLock<JournalBook>,
}

impl JournalStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access.
    pub async fn read(&self) -> RwLockReadGuard<'_, JournalBook> {
        self.book.read().await
    }

    /// Exclusive access.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, JournalBook> {
        self.book.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use stockledger_core::ledger::{JournalHeader, JournalLineInput};
    use stockledger_shared::types::{AccountId, ActorId, CurrencyCode};

    fn draft(source: Option<SourceDocument>) -> JournalEntry {
        let usd = CurrencyCode::new("USD").unwrap();
        LedgerService::build_draft(
            JournalHeader {
                document_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
                description: "Test".to_string(),
                source,
                reverses: None,
            },
            vec![
                JournalLineInput::debit(AccountId::new(), dec!(10), usd.clone()),
                JournalLineInput::credit(AccountId::new(), dec!(10), usd),
            ],
            ActorId::new(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_source() {
        let store = JournalStore::new();
        let source = SourceDocument::new("invoice", "INV-1");
        let entry = draft(Some(source.clone()));
        let id = entry.id;
        store.write().await.insert(entry);
        store.write().await.insert(draft(None));

        let book = store.read().await;
        assert_eq!(book.len(), 2);
        assert_eq!(book.for_source(&source).len(), 1);
        assert_eq!(book.for_source(&source)[0].id, id);
        assert_eq!(book.entries().next().map(|e| e.id), Some(id));
    }

    #[tokio::test]
    async fn test_remove_draft() {
        let store = JournalStore::new();
        let source = SourceDocument::new("invoice", "INV-2");
        let entry = draft(Some(source.clone()));
        let id = entry.id;
        store.write().await.insert(entry);

        let removed = store.write().await.remove_draft(id).unwrap();
        assert_eq!(removed.id, id);
        let book = store.read().await;
        assert!(book.is_empty());
        assert!(book.for_source(&source).is_empty());
    }

    #[tokio::test]
    async fn test_posted_entry_cannot_be_removed() {
        let store = JournalStore::new();
        let mut entry = draft(None);
        let id = entry.id;
        LedgerService::mark_posted(&mut entry, "JV-20240402-0001".to_string(), ActorId::new(), Utc::now())
            .unwrap();
        store.write().await.insert(entry);

        assert!(matches!(
            store.write().await.remove_draft(id),
            Err(LedgerError::InvalidState { operation: "cancel", .. })
        ));
        let unknown = JournalEntryId::new();
        assert_eq!(
            store.write().await.remove_draft(unknown),
            Err(LedgerError::EntryNotFound(unknown))
        );
        assert_eq!(store.read().await.len(), 1);
    }
}
