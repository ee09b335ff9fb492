//! Posting lock guard.
//!
//! Decision order:
//! 1. Actor holds `PostingOverride` → allowed, nothing else is checked
//! 2. Document date on or before the lock date → `PostingLocked`
//! 3. Document date inside a closed period → `PeriodClosed`
//! 4. Otherwise allowed
//!
//! The guard never mutates the lock state.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stockledger_shared::types::ActorId;

use super::error::FiscalError;
use super::period::PostingLockState;

/// Capabilities relevant to posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// May post into locked dates and closed periods.
    PostingOverride,
}

/// Who is asking, and what they may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identity, stamped on created and posted documents.
    pub id: ActorId,
    /// Granted capabilities.
    pub capabilities: BTreeSet<Capability>,
}

impl Actor {
    /// Creates an actor without capabilities.
    #[must_use]
    pub fn new(id: ActorId) -> Self {
        Self {
            id,
            capabilities: BTreeSet::new(),
        }
    }

    /// Adds a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Returns true if the actor holds `capability`.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Source of the lock state snapshot used for one posting attempt.
pub trait LockStateProvider {
    /// Returns the current lock state.
    fn snapshot(&self) -> PostingLockState;
}

impl LockStateProvider for PostingLockState {
    fn snapshot(&self) -> PostingLockState {
        self.clone()
    }
}

/// How a posting was permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostingPermit {
    /// No policy applied.
    Granted,
    /// Allowed through the override capability.
    Overridden {
        /// Reason given by the actor, if any.
        reason: Option<String>,
    },
}

impl PostingPermit {
    /// Returns true if the override capability was used.
    #[must_use]
    pub fn is_override(&self) -> bool {
        matches!(self, Self::Overridden { .. })
    }
}

/// Stateless posting permission checks.
pub struct PostingGuard;

impl PostingGuard {
    /// Decides whether `actor` may post a document dated `document_date`.
    ///
    /// `context` describes the attempted action and is echoed in
    /// `PostingLocked` so callers can render an actionable message.
    ///
    /// # Errors
    ///
    /// Returns `PostingLocked` or `PeriodClosed`.
    pub fn assert_allowed(
        state: &PostingLockState,
        actor: &Actor,
        document_date: NaiveDate,
        context: &str,
        override_reason: Option<&str>,
    ) -> Result<PostingPermit, FiscalError> {
        if actor.can(Capability::PostingOverride) {
            return Ok(PostingPermit::Overridden {
                reason: override_reason.map(str::to_string),
            });
        }

        if let Some(lock_date) = state.lock_date() {
            if document_date <= lock_date {
                return Err(FiscalError::PostingLocked {
                    lock_date,
                    document_date,
                    context: context.to_string(),
                });
            }
        }

        if let Some(period) = state.period_for(document_date) {
            if !period.is_open() {
                return Err(FiscalError::PeriodClosed {
                    period_code: period.code.clone(),
                    document_date,
                });
            }
        }

        Ok(PostingPermit::Granted)
    }

    /// Takes a fresh snapshot from `provider` and checks against it.
    ///
    /// # Errors
    ///
    /// See [`PostingGuard::assert_allowed`].
    pub fn check<P: LockStateProvider + ?Sized>(
        provider: &P,
        actor: &Actor,
        document_date: NaiveDate,
        context: &str,
        override_reason: Option<&str>,
    ) -> Result<PostingPermit, FiscalError> {
        let state = provider.snapshot();
        Self::assert_allowed(&state, actor, document_date, context, override_reason)
    }
}
