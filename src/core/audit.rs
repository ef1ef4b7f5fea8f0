//! Audit sink implementations.
//!
//! The scheduler reports every dispatch and outcome to an optional sink.
//! Dispatch events arrive in pop order, which makes the sink the hook for
//! observing dispatch order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Popped from the queue and handed to execution.
    Dispatch,
    /// Acquired a limiter slot and started running.
    Start,
    /// Finished successfully.
    Complete,
    /// Work returned an error.
    Fail,
    /// Exceeded its timeout.
    Timeout,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dispatch => "dispatch",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Fail => "fail",
            Self::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuditEvent {
    /// Batch identifier, if the task ran as part of `run_tasks`.
    pub batch: Option<String>,
    /// Task name.
    pub task: String,
    /// Task priority.
    pub priority: i64,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context, such as the failure message.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }

    /// Task names for every event with `action`, oldest first.
    #[must_use]
    pub fn tasks_with(&self, action: AuditAction) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.task.clone())
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Sink that can be handed to a scheduler while the caller keeps reading it.
pub struct SharedAuditSink<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedAuditSink<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: AuditSink> SharedAuditSink<S> {
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    /// Run `f` with the wrapped sink locked.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.lock())
    }
}

impl<S: AuditSink> AuditSink for SharedAuditSink<S> {
    fn record(&mut self, event: AuditEvent) {
        self.inner.lock().record(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    batch: Option<&str>,
    task: impl Into<String>,
    priority: i64,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        batch: batch.map(str::to_owned),
        task: task.into(),
        priority,
        action,
        created_at_ms: now_ms(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_audit_sink() {
        let mut sink = InMemoryAuditSink::new(10);
        sink.record(build_audit_event(Some("b1"), "t1", 3, AuditAction::Dispatch, None));
        sink.record(build_audit_event(
            Some("b1"),
            "t1",
            3,
            AuditAction::Fail,
            Some("boom".into()),
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].batch.as_deref(), Some("b1"));
        assert_eq!(events[1].detail.as_deref(), Some("boom"));
        assert_eq!(sink.tasks_with(AuditAction::Fail), ["t1"]);
    }

    #[test]
    fn test_audit_sink_overflow() {
        let mut sink = InMemoryAuditSink::new(2);
        for name in ["a", "b", "c"] {
            sink.record(build_audit_event(None, name, 0, AuditAction::Dispatch, None));
        }
        assert_eq!(sink.tasks_with(AuditAction::Dispatch), ["b", "c"]);
    }

    #[test]
    fn test_shared_sink_is_readable_after_handoff() {
        let shared = SharedAuditSink::new(InMemoryAuditSink::new(8));
        let mut handed_off: Box<dyn AuditSink> = Box::new(shared.clone());
        handed_off.record(build_audit_event(None, "x", 1, AuditAction::Complete, None));
        assert_eq!(shared.with(|s| s.events().len()), 1);
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&AuditAction::Timeout).unwrap();
        assert_eq!(json, "\"timeout\"");
        assert_eq!(AuditAction::Dispatch.to_string(), "dispatch");
    }
}
