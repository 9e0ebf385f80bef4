//! Analytics collaborator boundary
//!
//! Events are fire-and-forget: the engine never waits on a sink and never
//! fails because of one.

use crate::content::MediaKind;
use crate::scene::SceneDescriptor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Event reported to the analytics collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    /// The manager started a viewing session
    SessionStart {
        /// Portfolio id
        portfolio: String,
    },
    /// The viewing session ended
    SessionEnd {
        /// Portfolio id
        portfolio: String,
        /// Accumulated frame time of the session
        duration: Duration,
    },
    /// A scene finished building
    SceneReady {
        /// Scene that became active
        scene: SceneDescriptor,
    },
    /// A ready scene was left, by navigation or shutdown
    SceneExited {
        /// Scene that was left
        scene: SceneDescriptor,
        /// Accumulated frame time since the scene became ready
        duration: Duration,
    },
    /// A media popup was opened
    MediaOpened {
        /// Media source
        source: String,
        /// Media kind
        kind: MediaKind,
    },
}

/// Analytics delivery failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// The sink could not accept the event
    #[error("Analytics sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives analytics events
pub trait AnalyticsSink {
    /// Record one event
    fn track_event(&mut self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalytics;

impl AnalyticsSink for NullAnalytics {
    fn track_event(&mut self, _event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        Ok(())
    }
}

/// Writes events to the log at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn track_event(&mut self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        log::info!("analytics: {:?}", event);
        Ok(())
    }
}

/// Keeps events in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryAnalytics {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl MemoryAnalytics {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl AnalyticsSink for MemoryAnalytics {
    fn track_event(&mut self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.events
            .lock()
            .map_err(|e| AnalyticsError::Unavailable(e.to_string()))?
            .push(event);
        Ok(())
    }
}

/// Send an event, logging and swallowing any failure
pub fn track(sink: &mut dyn AnalyticsSink, event: AnalyticsEvent) {
    if let Err(e) = sink.track_event(event) {
        log::debug!("Dropping analytics event: {}", e);
    }
}
