//! Chat facade: rooms, messages and per-room live feeds
//!
//! Live updates come from the store's event bus. A writer in another
//! process (or another `Chat` over the same storage) is picked up by
//! [`Chat::refresh`], which republishes the differences on the bus.

use crate::core::error::{Result, ValidationError};
use crate::core::events::{EventEnvelope, StoreEvent};
use crate::core::field::FieldFormat;
use crate::core::query::{FilterState, PageRequest, PaginatedResponse, SortKey};
use crate::core::store::{EntityStore, StoreOptions};
use crate::entities::Message;
use crate::storage::{KeyValueStore, read_json, write_json};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

pub const ROOMS_KEY: &str = "rooms";

pub const DEFAULT_ROOMS: [&str; 2] = ["general", "random"];

pub struct Chat {
    messages: EntityStore<Message>,
    rooms: Vec<String>,
}

impl Chat {
    pub fn open(kv: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let rooms = read_json(kv.as_ref(), ROOMS_KEY).unwrap_or_else(|| {
            let defaults: Vec<String> = DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect();
            if let Err(e) = write_json(kv.as_ref(), ROOMS_KEY, &defaults) {
                tracing::warn!(error = %e, "failed to persist default rooms");
            }
            defaults
        });
        Self {
            messages: EntityStore::open(kv, options),
            rooms,
        }
    }

    pub fn teardown(self) -> Result<()> {
        self.messages.teardown()
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    pub fn messages(&self) -> &EntityStore<Message> {
        &self.messages
    }

    /// Add a room; names are lowercase slugs. `false` if it already exists.
    pub fn add_room(&mut self, name: &str) -> Result<bool> {
        let name = name.trim().to_lowercase();
        if !FieldFormat::Slug.matches(&name) {
            return Err(ValidationError::FieldError {
                field: "room".to_string(),
                message: format!("'{}' is not a valid room name", name),
            }
            .into());
        }
        if self.rooms.contains(&name) {
            return Ok(false);
        }
        self.rooms.push(name);
        write_json(self.messages.kv().as_ref(), ROOMS_KEY, &self.rooms)?;
        Ok(true)
    }

    /// Post into an existing room
    pub fn post_message(&mut self, room: &str, author: &str, body: &str) -> Result<Message> {
        let room = room.trim().to_lowercase();
        if !self.rooms.contains(&room) {
            return Err(ValidationError::FieldError {
                field: "room".to_string(),
                message: format!("unknown room '{}'", room),
            }
            .into());
        }
        self.messages.create(json!({ "room": room, "author": author, "body": body }))
    }

    /// Messages of `room`, oldest first
    pub fn history(&self, room: &str, page: PageRequest) -> PaginatedResponse<Message> {
        let filter = FilterState::default()
            .with_category(room.trim().to_lowercase())
            .with_sort(SortKey::Oldest);
        self.messages.query(&filter, page)
    }

    /// Live feed of new messages in `room`; drop it to unsubscribe
    pub fn subscribe(&self, room: &str) -> RoomFeed {
        RoomFeed {
            room: room.trim().to_lowercase(),
            rx: self.messages.subscribe(),
        }
    }

    /// Pick up messages written by another writer
    pub fn refresh(&mut self) -> Vec<StoreEvent> {
        self.messages.refresh()
    }
}

/// New messages of one room, taken from the store's event bus
pub struct RoomFeed {
    room: String,
    rx: broadcast::Receiver<EventEnvelope>,
}

impl RoomFeed {
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Every message received since the last call, without waiting.
    ///
    /// If the feed fell behind, the skipped events are lost and a warning is
    /// logged; the missed messages are still in the history.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => out.extend(self.accept(&envelope)),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(room = %self.room, skipped, "room feed lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        out
    }

    /// Wait for the next message; `None` once the store is gone
    pub async fn next(&mut self) -> Option<Message> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) => {
                    if let Some(message) = self.accept(&envelope) {
                        return Some(message);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(room = %self.room, skipped, "room feed lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn accept(&self, envelope: &EventEnvelope) -> Option<Message> {
        let StoreEvent::Created { data, .. } = &envelope.event else {
            return None;
        };
        let message: Message = serde_json::from_value(data.clone()).ok()?;
        (message.room == self.room).then_some(message)
    }
}
