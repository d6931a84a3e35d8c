use crate::model::Streamer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

#[cfg(test)]
mod tests;

/// Topic every registry notification is published under
pub const DATA_SOURCE_TOPIC: &str = "DataSourceEvent";

/// Kind of registry change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Added,
    Removed,
    Updated,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Added => "DataSourceAdded",
            EventKind::Removed => "DataSourceRemoved",
            EventKind::Updated => "DataSourceUpdated",
        };
        f.write_str(name)
    }
}

/// One registry change as delivered to consumers.
///
/// `streamer` is the new value for Added/Updated and the last known value
/// for Removed.
#[derive(Clone, Debug, Serialize)]
pub struct Notification {
    pub streamer: Streamer,
    pub topic: &'static str,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(streamer: Streamer, kind: EventKind) -> Self {
        Self {
            streamer,
            topic: DATA_SOURCE_TOPIC,
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of registry notifications.
///
/// `notify` is called while the registry applies a mutation, so
/// implementations must return without waiting on the consumer. The
/// registry's write lock is held during the call: reading or mutating the
/// same registry from `notify` deadlocks.
pub trait EventSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fan-out sink backed by a tokio broadcast channel.
///
/// Slow subscribers lag and lose the oldest notifications instead of
/// blocking the registry.
pub struct BroadcastSink {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventSink for BroadcastSink {
    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.tx.send(notification);
    }
}

/// Sink that keeps every notification in memory, in delivery order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// (kind, uid) pairs, handy for asserting order
    pub fn kinds(&self) -> Vec<(EventKind, i64)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|n| (n.kind, n.streamer.uid))
            .collect()
    }

    /// Drains and returns the recorded notifications
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
