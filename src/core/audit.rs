//! Optional in-memory ledger of emitted events, for tests and debugging.
//!
//! The pool's real observability surface is `tracing` events (see
//! `core::facade`); this sink is an opt-in hook for callers who want to
//! assert on event sequences without a tracing subscriber.

use std::collections::VecDeque;

use crate::util::clock::now_ms;

/// One emitted coordination event.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier, unique within this sink.
    pub event_id: String,
    /// Related task or worker identifier, stringified.
    pub subject_id: String,
    /// Action name (`task_submitted`, `worker_spawned`, ...), matching the
    /// event names the facade emits through `tracing`.
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink with a bounded ring buffer.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    event_id: impl Into<String>,
    subject_id: impl Into<String>,
    action: impl Into<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: event_id.into(),
        subject_id: subject_id.into(),
        action: action.into(),
        created_at_ms: now_ms(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut sink = InMemoryAuditSink::new(2);
        sink.record(build_audit_event("1", "t1", "task_submitted"));
        sink.record(build_audit_event("2", "t2", "task_submitted"));
        sink.record(build_audit_event("3", "t3", "task_submitted"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, "2");
        assert_eq!(events[1].event_id, "3");
    }
}
