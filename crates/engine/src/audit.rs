//! Audit trail sink.
//!
//! Recording is fire-and-forget: it happens after the operation committed
//! and can never fail the operation.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use stockledger_shared::types::ActorId;

/// Who did what to which record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    /// Acting user or system.
    pub actor: ActorId,
    /// Action name, e.g. `journal.posted`.
    pub action: &'static str,
    /// Identifier of the affected record.
    pub subject: String,
    /// Action-specific details.
    pub payload: Value,
    /// When the action committed.
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped now.
    pub fn new(actor: ActorId, action: &'static str, subject: impl ToString, payload: Value) -> Self {
        Self {
            actor,
            action,
            subject: subject.to_string(),
            payload,
            at: Utc::now(),
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    /// Records an event. Must not block for long or panic.
    fn record(&self, event: AuditEvent);
}

/// Writes audit events as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "stockledger::audit",
            actor = %event.actor,
            action = event.action,
            subject = %event.subject,
            payload = %event.payload,
            "Audit event"
        );
    }
}

/// Keeps audit events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of all events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events with the given action.
    #[must_use]
    pub fn events_for(&self, action: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemoryAuditSink::new();
        let actor = ActorId::new();
        sink.record(AuditEvent::new(actor, "journal.posted", "JV-1", json!({"lines": 2})));
        sink.record(AuditEvent::new(actor, "rate.upserted", "USD/TRY", Value::Null));

        assert_eq!(sink.events().len(), 2);
        let posted = sink.events_for("journal.posted");
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].payload["lines"], 2);
    }
}
