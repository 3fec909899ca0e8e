use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

/// Lifecycle stage of a resource during teardown.
///
/// For one resource the stages are strictly ordered
/// stopping → stopped → removing → removed, interrupted by error at any stage.
/// No ordering is guaranteed across different resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Stopping,
    Stopped,
    Removing,
    Removed,
    Error,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EventStatus::Stopping => "Stopping",
            EventStatus::Stopped => "Stopped",
            EventStatus::Removing => "Removing",
            EventStatus::Removed => "Removed",
            EventStatus::Error => "Error",
        };
        write!(f, "{text}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub resource: String,
    pub status: EventStatus,
    pub detail: Option<String>,
}

impl Event {

    pub fn stopping(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), status: EventStatus::Stopping, detail: None }
    }

    pub fn stopped(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), status: EventStatus::Stopped, detail: None }
    }

    pub fn removing(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), status: EventStatus::Removing, detail: None }
    }

    pub fn removed(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), status: EventStatus::Removed, detail: None }
    }

    pub fn error(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { resource: resource.into(), status: EventStatus::Error, detail: Some(detail.into()) }
    }
}

/// Sink for lifecycle events. Fire-and-forget; must never block teardown.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Renders lifecycle events through the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) {
        match (event.status, event.detail) {
            (EventStatus::Error, Some(detail)) => error!("{} {} {}", event.resource, event.status, detail),
            (EventStatus::Error, None) => error!("{} {}", event.resource, event.status),
            (status, _) => info!("{} {}", event.resource, status),
        }
    }
}

/// Buffers lifecycle events for later inspection.
#[derive(Clone, Debug, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingEventSink {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock()
            .expect("Failed to lock recorded events")
            .clone()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: Event) {
        self.events.lock()
            .expect("Failed to lock recorded events")
            .push(event);
    }
}
