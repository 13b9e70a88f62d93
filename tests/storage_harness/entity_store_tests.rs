//! Macro-generated test suite for `EntityStore` over a storage backend.
//!
//! Exercises load/save, the mutation API and id issuing against whatever
//! `KeyValueStore` the factory returns.
//!
//! # Usage
//!
//! ```rust,ignore
//! entity_store_tests!(InMemoryKeyValueStore::new());
//! ```

#[macro_export]
macro_rules! entity_store_tests {
    ($factory:expr) => {
        mod entity_store_contract_tests {
            use super::*;
            use serde_json::json;
            use shelf::core::store::{EntityStore, StoreOptions};
            use shelf::storage::KeyValueStore;
            use std::sync::Arc;

            fn shared_kv() -> Arc<dyn KeyValueStore> {
                Arc::new($factory)
            }

            fn open(kv: &Arc<dyn KeyValueStore>) -> EntityStore<TestRecord> {
                EntityStore::open(kv.clone(), StoreOptions::empty())
            }

            // === Create / get ===

            #[test]
            fn test_create_then_get() {
                let kv = shared_kv();
                let mut store = open(&kv);

                let created = store
                    .create(full_draft("Groceries", "Food", &["weekly"], 42.5, day(2024, 3, 1)))
                    .unwrap();

                let fetched = store.get(created.id).unwrap();
                assert_eq!(fetched, &created);
                assert_eq!(fetched.created_at, fetched.updated_at);
                assert_eq!(fetched.tags, vec!["weekly"]);
            }

            #[test]
            fn test_ids_are_unique_and_increasing() {
                let kv = shared_kv();
                let mut store = open(&kv);

                let ids: Vec<u64> = (0..5)
                    .map(|i| store.create(draft(&format!("r{}", i))).unwrap().id)
                    .collect();
                assert_eq!(ids, vec![1, 2, 3, 4, 5]);
            }

            #[test]
            fn test_create_rejects_invalid_draft() {
                let kv = shared_kv();
                let mut store = open(&kv);

                let err = store.create(json!({ "title": "   ", "amount": -3 })).unwrap_err();
                match err {
                    shelf::core::error::ShelfError::Validation(v) => {
                        assert_eq!(v.fields(), vec!["title", "amount"]);
                    }
                    other => panic!("expected validation error, got {:?}", other),
                }
                assert!(store.is_empty());
            }

            // === Persistence ===

            #[test]
            fn test_save_then_reopen_round_trips() {
                let kv = shared_kv();
                let mut store = open(&kv);
                store.create(full_draft("Rent", "Home", &["monthly"], 900.0, day(2024, 3, 1))).unwrap();
                store.create(draft("Coffee")).unwrap();
                let before = store.list().to_vec();

                let reopened = open(&kv);
                assert_eq!(reopened.list(), before.as_slice());
            }

            #[test]
            fn test_deleted_ids_are_not_reused_after_reopen() {
                let kv = shared_kv();
                let mut store = open(&kv);
                store.create(draft("a")).unwrap();
                let last = store.create(draft("b")).unwrap();
                store.delete(last.id).unwrap();

                let mut reopened = open(&kv);
                let next = reopened.create(draft("c")).unwrap();
                assert!(next.id > last.id);
            }

            #[test]
            fn test_corrupt_collection_falls_back_to_empty() {
                let kv = shared_kv();
                kv.set("test_records", "{not json").unwrap();

                let store = open(&kv);
                assert!(store.is_empty());
                assert_eq!(kv.get("test_records").unwrap().as_deref(), Some("[]"));
            }

            // === Update / delete ===

            #[test]
            fn test_empty_patch_only_bumps_updated_at() {
                let kv = shared_kv();
                let mut store = open(&kv);
                let created = store.create(draft("Same")).unwrap();

                let updated = store.update(created.id, json!({})).unwrap();
                assert!(updated.updated_at > created.updated_at);
                assert_eq!(
                    TestRecord { updated_at: created.updated_at, ..updated.clone() },
                    created
                );
            }

            #[test]
            fn test_update_ignores_reserved_keys() {
                let kv = shared_kv();
                let mut store = open(&kv);
                let created = store.create(draft("Original")).unwrap();

                let updated = store
                    .update(created.id, json!({ "id": 999, "title": "Renamed" }))
                    .unwrap();
                assert_eq!(updated.id, created.id);
                assert_eq!(updated.title, "Renamed");
                assert!(store.get(999).is_none());
            }

            #[test]
            fn test_update_missing_is_not_found() {
                let kv = shared_kv();
                let mut store = open(&kv);
                let err = store.update(404, json!({ "title": "x" })).unwrap_err();
                assert!(err.is_not_found());
            }

            #[test]
            fn test_delete_missing_leaves_collection_untouched() {
                let kv = shared_kv();
                let mut store = open(&kv);
                store.create(draft("keep")).unwrap();

                assert!(store.delete(404).unwrap_err().is_not_found());
                assert!(!store.remove(404));
                assert_eq!(store.len(), 1);
            }

            #[test]
            fn test_mutations_are_visible_in_storage() {
                let kv = shared_kv();
                let mut store = open(&kv);
                let a = store.create(draft("a")).unwrap();
                store.create(draft("b")).unwrap();
                store.delete(a.id).unwrap();

                let stored: Vec<TestRecord> =
                    shelf::storage::read_json(kv.as_ref(), "test_records").unwrap();
                assert_eq!(stored.len(), 1);
                assert_eq!(stored[0].title, "b");
            }
        }
    };
}
