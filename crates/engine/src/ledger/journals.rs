//! Journal posting, drafts and reversals.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stockledger_core::fiscal::Actor;
use stockledger_core::ledger::{
    JournalEntry, JournalHeader, JournalLineInput, LedgerService, ReversalService, SourceDocument,
};
use stockledger_shared::types::JournalEntryId;
use tracing::info;

use super::{StockLedger, permit_payload};
use crate::error::EngineResult;

/// A posting requested by an integration (invoice, receipt, payment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationJournal {
    /// Accounting date.
    pub document_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Originating business document.
    pub source: SourceDocument,
    /// Lines in base currency.
    pub lines: Vec<JournalLineInput>,
    /// Justification when the actor overrides the posting lock.
    #[serde(default)]
    pub override_reason: Option<String>,
}

/// A manually authored entry, created as a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftJournal {
    /// Accounting date.
    pub document_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Originating business document, if any.
    #[serde(default)]
    pub source: Option<SourceDocument>,
    /// Lines in base currency.
    pub lines: Vec<JournalLineInput>,
}

impl StockLedger {
    /// Validates and posts an integration journal in one step.
    ///
    /// The entry is stored already posted, with its number allocated from
    /// the journal sequence of its document date.
    ///
    /// # Errors
    ///
    /// `PostingLocked`, `PeriodClosed`, `InsufficientLines`, `InvalidLine`
    /// or `UnbalancedJournal`. Nothing is stored and no number is used.
    pub async fn post_integration_journal(
        &self,
        actor: &Actor,
        request: IntegrationJournal,
    ) -> EngineResult<JournalEntry> {
        let context = format!("journal for {}", request.source);
        let permit = self.guard(
            actor,
            request.document_date,
            &context,
            request.override_reason.as_deref(),
        )?;
        self.validate(&request.lines).await?;
        let key = self.journal_key(request.document_date)?;

        let header = JournalHeader {
            document_date: request.document_date,
            description: request.description,
            source: Some(request.source),
            reverses: None,
        };
        let now = Utc::now();
        let mut entry = LedgerService::build_draft(header, request.lines, actor.id, now);

        let mut book = self.journals.write().await;
        let number = self.sequences.next(&key);
        LedgerService::mark_posted(&mut entry, number.to_string(), actor.id, now)?;
        book.insert(entry.clone());
        drop(book);

        info!(
            actor = %actor.id,
            entry_id = %entry.id,
            document_number = %number,
            lines = entry.lines.len(),
            "Integration journal posted"
        );
        self.record(
            actor,
            "journal.posted",
            &number,
            json!({
                "entry_id": entry.id,
                "source": entry.source.as_ref().map(ToString::to_string),
                "debit": entry.totals().debit,
                "override": permit_payload(&permit),
            }),
        );
        Ok(entry)
    }

    /// Validates the lines and stores them as a draft without a number.
    ///
    /// # Errors
    ///
    /// `InsufficientLines`, `InvalidLine` or `UnbalancedJournal`.
    pub async fn create_draft_journal(
        &self,
        actor: &Actor,
        request: DraftJournal,
    ) -> EngineResult<JournalEntry> {
        self.validate(&request.lines).await?;

        let header = JournalHeader {
            document_date: request.document_date,
            description: request.description,
            source: request.source,
            reverses: None,
        };
        let entry = LedgerService::build_draft(header, request.lines, actor.id, Utc::now());
        self.journals.write().await.insert(entry.clone());

        info!(actor = %actor.id, entry_id = %entry.id, "Draft journal created");
        self.record(
            actor,
            "journal.draft_created",
            entry.id,
            json!({ "lines": entry.lines.len() }),
        );
        Ok(entry)
    }

    /// Posts a draft: re-validates, re-checks the guard against the draft's
    /// own date, numbers it and marks it posted. Succeeds at most once.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, `InvalidState` if it is not a draft (including when
    /// a concurrent call posted it first), guard denials or validation
    /// errors.
    pub async fn post_draft_journal(
        &self,
        actor: &Actor,
        entry_id: JournalEntryId,
        override_reason: Option<&str>,
    ) -> EngineResult<JournalEntry> {
        let draft = {
            let book = self.journals.read().await;
            let entry = book.require(entry_id)?;
            LedgerService::ensure_draft(entry, "post")?;
            entry.clone()
        };

        let permit = self.guard(
            actor,
            draft.document_date,
            &format!("draft journal {entry_id}"),
            override_reason,
        )?;
        self.validate(&draft.line_inputs()).await?;
        let key = self.journal_key(draft.document_date)?;

        let mut book = self.journals.write().await;
        let mut entry = book.require(entry_id)?.clone();
        LedgerService::ensure_draft(&entry, "post")?;
        let now = Utc::now();
        let number = self.sequences.next(&key);
        LedgerService::mark_posted(&mut entry, number.to_string(), actor.id, now)?;
        book.replace(entry.clone());
        drop(book);

        info!(
            actor = %actor.id,
            entry_id = %entry_id,
            document_number = %number,
            "Draft journal posted"
        );
        self.record(
            actor,
            "journal.posted",
            &number,
            json!({ "entry_id": entry_id, "override": permit_payload(&permit) }),
        );
        Ok(entry)
    }

    /// Deletes a draft. Posted entries are permanent.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, or `InvalidState` for a posted entry.
    pub async fn cancel_draft(&self, actor: &Actor, entry_id: JournalEntryId) -> EngineResult<()> {
        let removed = self.journals.write().await.remove_draft(entry_id)?;

        info!(actor = %actor.id, entry_id = %entry_id, "Draft journal cancelled");
        self.record(
            actor,
            "journal.draft_cancelled",
            entry_id,
            json!({ "description": removed.description }),
        );
        Ok(())
    }

    /// Posts a new entry undoing `entry_id`, dated `document_date`.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`
    /// - `InvalidState` if the original is a draft
    /// - `CannotReverseReversal` if the original is itself a reversal
    /// - `AlreadyReversed` if it was reversed before
    /// - `PostingLocked` / `PeriodClosed` for the reversal date
    pub async fn reverse_journal(
        &self,
        actor: &Actor,
        entry_id: JournalEntryId,
        document_date: NaiveDate,
        reason: &str,
    ) -> EngineResult<JournalEntry> {
        let permit = self.guard(
            actor,
            document_date,
            &format!("reversal of journal {entry_id}"),
            Some(reason),
        )?;

        let draft = {
            let book = self.journals.read().await;
            ReversalService::prepare(
                book.require(entry_id)?,
                book.reversal_of(entry_id),
                document_date,
                reason,
            )?
        };
        self.validate(&draft.lines).await?;
        let key = self.journal_key(document_date)?;

        let mut book = self.journals.write().await;
        // A concurrent reversal may have landed since the read above.
        let draft = ReversalService::prepare(
            book.require(entry_id)?,
            book.reversal_of(entry_id),
            document_date,
            reason,
        )?;
        let now = Utc::now();
        let mut entry = LedgerService::build_draft(draft.header, draft.lines, actor.id, now);
        let number = self.sequences.next(&key);
        LedgerService::mark_posted(&mut entry, number.to_string(), actor.id, now)?;
        book.insert(entry.clone());
        drop(book);

        info!(
            actor = %actor.id,
            original = %entry_id,
            reversal = %entry.id,
            document_number = %number,
            "Journal reversed"
        );
        self.record(
            actor,
            "journal.reversed",
            &number,
            json!({
                "original": entry_id,
                "reason": reason,
                "override": permit_payload(&permit),
            }),
        );
        Ok(entry)
    }

    /// Looks up an entry.
    pub async fn journal(&self, entry_id: JournalEntryId) -> Option<JournalEntry> {
        self.journals.read().await.get(entry_id).cloned()
    }

    /// Entries created for a source document, oldest first.
    pub async fn journals_for_source(&self, doc_type: &str, doc_id: &str) -> Vec<JournalEntry> {
        let source = SourceDocument::new(doc_type, doc_id);
        self.journals
            .read()
            .await
            .for_source(&source)
            .into_iter()
            .cloned()
            .collect()
    }
}
