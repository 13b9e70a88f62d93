//! Change notifications for entity stores
//!
//! Every successful mutation publishes a [`StoreEvent`] on the store's
//! [`EventBus`]. Dependents (dashboards, chat feeds) subscribe instead of
//! re-reading storage on a timer; dropping the receiver unsubscribes.
//!
//! # Architecture
//!
//! ```text
//! create/update/delete ──┐
//!                        ├──▶ EventBus::publish() ──▶ broadcast channel ──▶ subscribers
//! reload/refresh ────────┘
//! ```
//!
//! The bus is a `tokio::sync::broadcast` channel. Publishing and `try_recv`
//! are synchronous, so no runtime is needed to use it from plain code.

use crate::core::entity::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events related to a collection's records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A record was created
    Created {
        collection: String,
        id: EntityId,
        data: serde_json::Value,
    },
    /// A record was updated
    Updated {
        collection: String,
        id: EntityId,
        data: serde_json::Value,
    },
    /// A record was deleted
    Deleted { collection: String, id: EntityId },
    /// The whole collection was replaced from storage (import, reload)
    Reloaded { collection: String, count: usize },
}

impl StoreEvent {
    /// Get the collection this event relates to
    pub fn collection(&self) -> &str {
        match self {
            StoreEvent::Created { collection, .. }
            | StoreEvent::Updated { collection, .. }
            | StoreEvent::Deleted { collection, .. }
            | StoreEvent::Reloaded { collection, .. } => collection,
        }
    }

    /// Get the record id this event relates to (if applicable)
    pub fn id(&self) -> Option<EntityId> {
        match self {
            StoreEvent::Created { id, .. }
            | StoreEvent::Updated { id, .. }
            | StoreEvent::Deleted { id, .. } => Some(*id),
            StoreEvent::Reloaded { .. } => None,
        }
    }

    /// Record payload for created/updated events
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            StoreEvent::Created { data, .. } | StoreEvent::Updated { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Get the action name (created, updated, deleted, reloaded)
    pub fn action(&self) -> &str {
        match self {
            StoreEvent::Created { .. } => "created",
            StoreEvent::Updated { .. } => "updated",
            StoreEvent::Deleted { .. } => "deleted",
            StoreEvent::Reloaded { .. } => "reloaded",
        }
    }
}

/// Envelope wrapping a store event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: StoreEvent,
}

impl EventEnvelope {
    /// Create a new event envelope
    pub fn new(event: StoreEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// The bus is cheap to clone (Arc internally); clones publish to the same
/// subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before
    /// slow receivers start losing events (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails. Without subscribers the event is dropped. Returns the
    /// number of receivers that will see the event.
    pub fn publish(&self, event: StoreEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
