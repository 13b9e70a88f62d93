//! Entity store: the authoritative in-memory collection mirrored to storage
//!
//! An [`EntityStore`] is constructed explicitly ([`EntityStore::open`]) and
//! handed to whoever needs it; there is no global instance. Its lifecycle is
//! `open` (load or seed) → mutations → [`EntityStore::teardown`].
//!
//! The stored value under [`Entity::resource_name`] is always a complete
//! snapshot of the collection. The id high-water mark lives next to it under
//! `<resource>.seq` so deleted ids are never handed out again.

use crate::core::entity::{Entity, EntityId};
use crate::core::error::Result;
use crate::core::events::{EventBus, EventEnvelope, StoreEvent};
use crate::storage::{KeyValueStore, read_json, write_json};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Options controlling how a store initialises itself
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Write [`Entity::seed`] records when storage holds nothing usable
    pub seed_defaults: bool,
    /// Buffer size of the change-notification channel
    pub event_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            seed_defaults: true,
            event_capacity: 256,
        }
    }
}

impl StoreOptions {
    /// Options for an empty store without sample data
    pub fn empty() -> Self {
        Self {
            seed_defaults: false,
            ..Self::default()
        }
    }
}

/// In-memory ordered collection of `T`, persisted as one JSON array
pub struct EntityStore<T: Entity> {
    pub(crate) kv: Arc<dyn KeyValueStore>,
    pub(crate) records: Vec<T>,
    pub(crate) last_issued: EntityId,
    pub(crate) bus: EventBus,
    options: StoreOptions,
}

impl<T: Entity> EntityStore<T> {
    /// Initialise the store from `kv`.
    ///
    /// Never fails: an absent or unparsable collection is replaced by the
    /// seed collection (or an empty one), which is persisted right away.
    pub fn open(kv: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let bus = EventBus::new(options.event_capacity);
        let mut store = Self {
            kv,
            records: Vec::new(),
            last_issued: 0,
            bus,
            options,
        };
        store.records = store.load();
        store.last_issued = store.stored_sequence().max(max_id(&store.records));
        tracing::debug!(
            collection = T::resource_name(),
            count = store.records.len(),
            "entity store opened"
        );
        store
    }

    /// Persist the final snapshot and release the store.
    ///
    /// Subscribers observe the channel closing once the last bus handle drops.
    pub fn teardown(self) -> Result<()> {
        self.save()?;
        self.persist_sequence();
        tracing::debug!(collection = T::resource_name(), "entity store closed");
        Ok(())
    }

    /// Read the collection from storage, seeding it when absent or corrupt.
    ///
    /// Duplicate ids found in storage keep their first occurrence.
    pub fn load(&self) -> Vec<T> {
        match read_json::<Vec<T>>(self.kv.as_ref(), T::resource_name()) {
            Some(records) => dedupe_ids(records),
            None => {
                let seeded = if self.options.seed_defaults {
                    T::seed()
                } else {
                    Vec::new()
                };
                tracing::info!(
                    collection = T::resource_name(),
                    count = seeded.len(),
                    "no usable stored collection, writing defaults"
                );
                if let Err(e) = write_json(self.kv.as_ref(), T::resource_name(), &seeded) {
                    tracing::warn!(collection = T::resource_name(), error = %e, "failed to persist defaults");
                }
                seeded
            }
        }
    }

    /// Overwrite the stored collection with the in-memory one
    pub fn save(&self) -> Result<()> {
        write_json(self.kv.as_ref(), T::resource_name(), &self.records)
    }

    /// The id the next created record will receive
    pub fn next_id(&self) -> EntityId {
        self.last_issued.max(max_id(&self.records)) + 1
    }

    /// All records in collection order
    pub fn list(&self) -> &[T] {
        &self.records
    }

    /// Get a record by id
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Subscribe to change notifications; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.bus.subscribe()
    }

    /// The bus this store publishes on
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The backing key-value store
    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    /// Replace the in-memory collection with what storage holds now.
    ///
    /// Used after imports. Publishes a single `Reloaded` event.
    pub fn reload(&mut self) -> usize {
        self.records = self.load();
        self.last_issued = self
            .last_issued
            .max(self.stored_sequence())
            .max(max_id(&self.records));
        let count = self.records.len();
        self.bus.publish(StoreEvent::Reloaded {
            collection: T::resource_name().to_string(),
            count,
        });
        count
    }

    /// Pick up changes written to storage by another writer.
    ///
    /// Diffs storage against memory by id and `updated_at`, adopts the stored
    /// collection, and publishes (and returns) one event per difference. A
    /// missing or corrupt stored value is ignored rather than re-seeded.
    pub fn refresh(&mut self) -> Vec<StoreEvent> {
        let Some(stored) = read_json::<Vec<T>>(self.kv.as_ref(), T::resource_name()) else {
            return Vec::new();
        };
        let stored = dedupe_ids(stored);
        let collection = T::resource_name().to_string();

        let known: HashMap<EntityId, DateTime<Utc>> =
            self.records.iter().map(|r| (r.id(), r.updated_at())).collect();
        let stored_ids: HashSet<EntityId> = stored.iter().map(|r| r.id()).collect();

        let mut events = Vec::new();
        for record in &stored {
            let data = serde_json::to_value(record).unwrap_or_default();
            match known.get(&record.id()) {
                None => events.push(StoreEvent::Created {
                    collection: collection.clone(),
                    id: record.id(),
                    data,
                }),
                Some(updated_at) if *updated_at != record.updated_at() => {
                    events.push(StoreEvent::Updated {
                        collection: collection.clone(),
                        id: record.id(),
                        data,
                    })
                }
                Some(_) => {}
            }
        }
        for record in &self.records {
            if !stored_ids.contains(&record.id()) {
                events.push(StoreEvent::Deleted {
                    collection: collection.clone(),
                    id: record.id(),
                });
            }
        }

        self.last_issued = self
            .last_issued
            .max(self.stored_sequence())
            .max(max_id(&stored));
        self.records = stored;

        if !events.is_empty() {
            tracing::debug!(collection = %collection, changes = events.len(), "picked up external changes");
        }
        for event in &events {
            self.bus.publish(event.clone());
        }
        events
    }

    pub(crate) fn sequence_key() -> String {
        format!("{}.seq", T::resource_name())
    }

    fn stored_sequence(&self) -> EntityId {
        read_json::<EntityId>(self.kv.as_ref(), &Self::sequence_key()).unwrap_or(0)
    }

    /// Best effort: the collection itself is the source of truth for ids
    pub(crate) fn persist_sequence(&self) {
        if let Err(e) = write_json(self.kv.as_ref(), &Self::sequence_key(), &self.last_issued) {
            tracing::warn!(collection = T::resource_name(), error = %e, "failed to persist id sequence");
        }
    }
}

/// A timestamp strictly after `previous`, normally "now"
pub(crate) fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn max_id<T: Entity>(records: &[T]) -> EntityId {
    records.iter().map(|r| r.id()).max().unwrap_or(0)
}

fn dedupe_ids<T: Entity>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();
    let records: Vec<T> = records.into_iter().filter(|r| seen.insert(r.id())).collect();
    if records.len() != before {
        tracing::warn!(
            collection = T::resource_name(),
            dropped = before - records.len(),
            "dropped records with duplicate ids"
        );
    }
    records
}
