//! Observability side channel for pipeline stages.
//!
//! Every stage reports what it did through an [`EventSink`] handed to it by
//! the caller instead of logging through process-wide state. A run creates
//! one sink, passes it to every stage, and flushes it when the run ends.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Error,
}

/// One informational or error event emitted by a stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub level: EventLevel,
    /// Pipeline component, e.g. `"ResponseCapture"`.
    pub component: &'static str,
    /// Operation within the component, e.g. `"extract"`.
    pub operation: &'static str,
    /// Snapshot of the data the event is about. `Null` when there is none.
    pub payload: serde_json::Value,
    pub message: String,
    pub at: DateTime<Utc>,
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: StageEvent);

    /// Called once at the end of a run.
    fn flush(&self) {}

    fn info(
        &self,
        component: &'static str,
        operation: &'static str,
        payload: serde_json::Value,
        message: &str,
    ) {
        self.record(StageEvent {
            level: EventLevel::Info,
            component,
            operation,
            payload,
            message: message.to_string(),
            at: Utc::now(),
        });
    }

    fn error(
        &self,
        component: &'static str,
        operation: &'static str,
        payload: serde_json::Value,
        message: &str,
    ) {
        self.record(StageEvent {
            level: EventLevel::Error,
            component,
            operation,
            payload,
            message: message.to_string(),
            at: Utc::now(),
        });
    }
}

/// Forwards stage events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: StageEvent) {
        match event.level {
            EventLevel::Info => tracing::info!(
                component = event.component,
                operation = event.operation,
                payload = %event.payload,
                "{}",
                event.message
            ),
            EventLevel::Error => tracing::error!(
                component = event.component,
                operation = event.operation,
                payload = %event.payload,
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps every event in memory, optionally forwarding to an inner sink.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<StageEvent>>,
    forward: Option<Box<dyn EventSink>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record events and also pass each one to `inner`.
    #[must_use]
    pub fn forwarding(inner: impl EventSink + 'static) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            forward: Some(Box::new(inner)),
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<StageEvent> {
        self.lock().clone()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.level == EventLevel::Error)
            .count()
    }

    /// `true` if any event's message contains `needle`.
    #[must_use]
    pub fn contains_message(&self, needle: &str) -> bool {
        self.lock().iter().any(|e| e.message.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StageEvent>> {
        // A panic while holding the lock leaves the Vec intact; keep using it.
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: StageEvent) {
        if let Some(inner) = &self.forward {
            inner.record(event.clone());
        }
        self.lock().push(event);
    }

    fn flush(&self) {
        if let Some(inner) = &self.forward {
            inner.flush();
        }
    }
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink")
            .field("events", &self.lock().len())
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}
