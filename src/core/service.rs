//! Mutation API: the only sanctioned way to change a collection
//!
//! Every mutation follows the same steps: validate, change the in-memory
//! collection, overwrite storage with the full snapshot, publish a change
//! event. When the write fails the in-memory change is rolled back, so memory
//! and storage never disagree after a call returns.

use crate::core::entity::{Data, EntityId, Operation};
use crate::core::error::{EntityError, Result, ShelfError, ValidationError};
use crate::core::events::StoreEvent;
use crate::core::store::{EntityStore, next_timestamp};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// Keys the store owns; patches cannot touch them
const RESERVED_KEYS: [&str; 3] = ["id", "created_at", "updated_at"];

impl<T: Data> EntityStore<T> {
    /// Validate `draft`, assign id and timestamps, append and persist.
    ///
    /// On validation failure nothing changes and the error lists every
    /// failing field.
    pub fn create(&mut self, draft: Value) -> Result<T> {
        let mut object = match T::validation_config(Operation::Create).validate_and_filter(draft)? {
            Value::Object(object) => object,
            _ => return Err(ShelfError::Internal("validated draft is not an object".to_string())),
        };

        let id = self.next_id();
        let now = Utc::now();
        let timestamp = serde_json::to_value(now).map_err(|e| ShelfError::Internal(e.to_string()))?;
        object.insert("id".to_string(), Value::from(id));
        object.insert("created_at".to_string(), timestamp.clone());
        object.insert("updated_at".to_string(), timestamp);

        let record: T = decode_record(Value::Object(object))?;

        self.records.push(record.clone());
        if let Err(e) = self.save() {
            self.records.pop();
            tracing::warn!(collection = T::resource_name(), error = %e, "create rolled back");
            return Err(e);
        }
        self.last_issued = id;
        self.persist_sequence();

        tracing::debug!(collection = T::resource_name(), id, "record created");
        self.publish_upsert(&record, true);
        Ok(record)
    }

    /// Typed convenience over [`EntityStore::create`]
    pub fn create_from<D: Serialize>(&mut self, draft: &D) -> Result<T> {
        let draft = serde_json::to_value(draft).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
        })?;
        self.create(draft)
    }

    /// Shallow-merge `patch` over the record `id` and bump `updated_at`.
    ///
    /// `id`, `created_at` and `updated_at` in the patch are ignored. An empty
    /// patch only refreshes `updated_at`.
    pub fn update(&mut self, id: EntityId, patch: Value) -> Result<T> {
        let index = self.index_of(id)?;
        let Value::Object(patch) = patch else {
            return Err(ValidationError::InvalidJson {
                message: format!("patch for {} {} must be a JSON object", T::resource_name_singular(), id),
            }
            .into());
        };

        let current = &self.records[index];
        let mut merged = match serde_json::to_value(current) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return Err(ShelfError::Internal("entity did not serialize to an object".to_string())),
            Err(e) => return Err(ShelfError::Internal(e.to_string())),
        };
        for (key, value) in patch {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                merged.insert(key, value);
            }
        }

        let validated = T::validation_config(Operation::Update).validate_and_filter(Value::Object(merged))?;
        let mut record: T = decode_record(validated)?;
        record.set_updated_at(next_timestamp(current.updated_at()));

        let previous = std::mem::replace(&mut self.records[index], record.clone());
        if let Err(e) = self.save() {
            self.records[index] = previous;
            tracing::warn!(collection = T::resource_name(), id, error = %e, "update rolled back");
            return Err(e);
        }

        tracing::debug!(collection = T::resource_name(), id, "record updated");
        self.publish_upsert(&record, false);
        Ok(record)
    }

    /// Remove the record `id`, failing with `NotFound` when absent
    pub fn delete(&mut self, id: EntityId) -> Result<T> {
        let index = self.index_of(id)?;
        let removed = self.records.remove(index);
        if let Err(e) = self.save() {
            self.records.insert(index, removed);
            tracing::warn!(collection = T::resource_name(), id, error = %e, "delete rolled back");
            return Err(e);
        }

        tracing::debug!(collection = T::resource_name(), id, "record deleted");
        self.bus.publish(StoreEvent::Deleted {
            collection: T::resource_name().to_string(),
            id,
        });
        Ok(removed)
    }

    /// No-op variant of [`EntityStore::delete`]: `false` when nothing was removed
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.delete(id) {
            Ok(_) => true,
            Err(e) => {
                if !e.is_not_found() {
                    tracing::warn!(collection = T::resource_name(), id, error = %e, "remove failed");
                }
                false
            }
        }
    }

    /// Apply `change` to every record matching `predicate` with a single save.
    ///
    /// `change` returns whether it modified the record; only modified records
    /// get a new `updated_at` and an `Updated` event. Returns the number of
    /// modified records.
    pub fn update_where<P, F>(&mut self, mut predicate: P, mut change: F) -> Result<usize>
    where
        P: FnMut(&T) -> bool,
        F: FnMut(&mut T) -> bool,
    {
        let snapshot = self.records.clone();
        let mut touched = Vec::new();

        for record in self.records.iter_mut().filter(|r| predicate(r)) {
            if change(record) {
                record.set_updated_at(next_timestamp(record.updated_at()));
                touched.push(record.id());
            }
        }

        if touched.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.save() {
            self.records = snapshot;
            tracing::warn!(collection = T::resource_name(), error = %e, "bulk update rolled back");
            return Err(e);
        }

        tracing::debug!(collection = T::resource_name(), count = touched.len(), "bulk update");
        for id in &touched {
            if let Some(record) = self.get(*id).cloned() {
                self.publish_upsert(&record, false);
            }
        }
        Ok(touched.len())
    }

    fn index_of(&self, id: EntityId) -> Result<usize> {
        self.records.iter().position(|r| r.id() == id).ok_or_else(|| {
            EntityError::NotFound {
                entity_type: T::resource_name_singular().to_string(),
                id,
            }
            .into()
        })
    }

    fn publish_upsert(&self, record: &T, created: bool) {
        let collection = T::resource_name().to_string();
        let id = record.id();
        let data = serde_json::to_value(record).unwrap_or_default();
        let event = if created {
            StoreEvent::Created { collection, id, data }
        } else {
            StoreEvent::Updated { collection, id, data }
        };
        self.bus.publish(event);
    }
}

fn decode_record<T: Data>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        ValidationError::InvalidJson {
            message: format!("invalid {}: {}", T::resource_name_singular(), e),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::core::validation::{EntityValidationConfig, filters, validators};
    use crate::storage::{InMemoryKeyValueStore, KeyValueStore, read_json};
    use crate::core::store::StoreOptions;
    use chrono::DateTime;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Task {
        id: EntityId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        title: String,
        #[serde(default)]
        done: bool,
        #[serde(default)]
        labels: Vec<String>,
    }

    crate::impl_entity!(Task, "tasks", "task");

    impl Data for Task {
        fn title(&self) -> &str {
            &self.title
        }

        fn indexed_fields() -> &'static [&'static str] {
            &["title"]
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "title" => Some(self.title.clone().into()),
                _ => None,
            }
        }

        fn validation_config(_operation: Operation) -> EntityValidationConfig {
            EntityValidationConfig::new("task")
                .filter("title", filters::trim())
                .validate("title", validators::required())
        }
    }

    /// Key-value store whose writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryKeyValueStore,
        fail_writes: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn backend_name(&self) -> &'static str {
            "flaky"
        }

        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(crate::core::error::StorageError::Unavailable {
                    backend: "flaky".to_string(),
                }
                .into());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<bool> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys()
        }
    }

    fn store() -> EntityStore<Task> {
        EntityStore::open(Arc::new(InMemoryKeyValueStore::new()), StoreOptions::empty())
    }

    #[test]
    fn test_create_assigns_id_and_timestamps() {
        let mut store = store();
        let task = store.create(json!({"title": "  write docs "})).unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "write docs");
        assert_eq!(task.created_at, task.updated_at);
        assert!(!task.done);

        let stored: Vec<Task> = read_json(store.kv().as_ref(), "tasks").unwrap();
        assert_eq!(stored, vec![task]);
    }

    #[test]
    fn test_create_rejects_missing_fields_without_mutation() {
        let mut store = store();
        let err = store.create(json!({})).unwrap_err();
        match err {
            ShelfError::Validation(v) => assert_eq!(v.fields(), vec!["title"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.is_empty());
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn test_create_rejects_ill_typed_fields() {
        let mut store = store();
        let err = store.create(json!({"title": "x", "done": "yes"})).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_are_never_reused_after_delete() {
        let mut store = store();
        store.create(json!({"title": "a"})).unwrap();
        let b = store.create(json!({"title": "b"})).unwrap();
        store.delete(b.id).unwrap();
        let c = store.create(json!({"title": "c"})).unwrap();
        assert_eq!(c.id, 3);

        let reopened: EntityStore<Task> = EntityStore::open(store.kv().clone(), StoreOptions::empty());
        assert_eq!(reopened.next_id(), 4);
    }

    #[test]
    fn test_update_merges_and_ignores_reserved_keys() {
        let mut store = store();
        let task = store.create(json!({"title": "a"})).unwrap();
        let updated = store
            .update(task.id, json!({"done": true, "id": 99, "created_at": "2000-01-01T00:00:00Z"}))
            .unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.done);
        assert_eq!(updated.title, "a");
        assert!(updated.updated_at > task.updated_at);
    }

    #[test]
    fn test_empty_patch_only_bumps_updated_at() {
        let mut store = store();
        let task = store.create(json!({"title": "a", "labels": ["x"]})).unwrap();
        let updated = store.update(task.id, json!({})).unwrap();
        assert!(updated.updated_at > task.updated_at);
        assert_eq!(
            Task {
                updated_at: task.updated_at,
                ..updated
            },
            task
        );
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let mut store = store();
        let err = store.update(5, json!({})).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_cannot_blank_required_field() {
        let mut store = store();
        let task = store.create(json!({"title": "a"})).unwrap();
        let err = store.update(task.id, json!({"title": "  "})).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(store.get(task.id).unwrap().title, "a");
    }

    #[test]
    fn test_update_rejects_non_object_patch() {
        let mut store = store();
        let task = store.create(json!({"title": "a"})).unwrap();
        assert!(store.update(task.id, json!("done")).is_err());
    }

    #[test]
    fn test_delete_and_remove() {
        let mut store = store();
        let task = store.create(json!({"title": "a"})).unwrap();
        assert!(store.delete(42).unwrap_err().is_not_found());
        assert!(!store.remove(42));
        assert!(store.remove(task.id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_mutations_publish_events() {
        let mut store = store();
        let mut rx = store.subscribe();

        let task = store.create(json!({"title": "a"})).unwrap();
        store.update(task.id, json!({"done": true})).unwrap();
        store.delete(task.id).unwrap();

        let actions: Vec<String> = (0..3)
            .map(|_| rx.try_recv().unwrap().event.action().to_string())
            .collect();
        assert_eq!(actions, vec!["created", "updated", "deleted"]);
    }

    #[test]
    fn test_update_where_saves_once_and_counts_changes() {
        let mut store = store();
        store.create(json!({"title": "a", "labels": ["x", "y"]})).unwrap();
        store.create(json!({"title": "b", "labels": ["y"]})).unwrap();
        store.create(json!({"title": "c"})).unwrap();

        let changed = store
            .update_where(
                |t| t.labels.iter().any(|l| l == "y"),
                |t| {
                    t.labels.retain(|l| l != "y");
                    true
                },
            )
            .unwrap();
        assert_eq!(changed, 2);
        assert!(store.list().iter().all(|t| !t.labels.contains(&"y".to_string())));

        let stored: Vec<Task> = read_json(store.kv().as_ref(), "tasks").unwrap();
        assert_eq!(stored, store.list());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let kv = Arc::new(FlakyStore::default());
        let mut store: EntityStore<Task> = EntityStore::open(kv.clone(), StoreOptions::empty());
        let task = store.create(json!({"title": "a"})).unwrap();

        kv.fail_writes.store(true, Ordering::SeqCst);
        let err = store.create(json!({"title": "b"})).unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert_eq!(store.len(), 1);

        assert!(store.update(task.id, json!({"title": "z"})).is_err());
        assert_eq!(store.get(task.id).unwrap().title, "a");

        assert!(store.delete(task.id).is_err());
        assert_eq!(store.len(), 1);
    }
}
