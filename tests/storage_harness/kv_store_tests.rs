//! Macro-generated test suite for the `KeyValueStore` contract.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! kv_store_tests!(InMemoryKeyValueStore::new());
//! ```
//!
//! `$factory` is re-evaluated for each test. The concurrency test needs the
//! returned store to be `Clone + 'static` with clones sharing state.

#[macro_export]
macro_rules! kv_store_tests {
    ($factory:expr) => {
        mod kv_store_contract_tests {
            use super::*;
            use shelf::storage::KeyValueStore;

            #[test]
            fn test_get_missing_key() {
                let kv = $factory;
                assert_eq!(kv.get("posts").unwrap(), None);
            }

            #[test]
            fn test_set_then_get() {
                let kv = $factory;
                kv.set("posts", r#"[{"id":1}]"#).unwrap();
                assert_eq!(kv.get("posts").unwrap().as_deref(), Some(r#"[{"id":1}]"#));
            }

            #[test]
            fn test_set_overwrites_whole_value() {
                let kv = $factory;
                kv.set("tags", r#"["a","b","c"]"#).unwrap();
                kv.set("tags", r#"["z"]"#).unwrap();
                assert_eq!(kv.get("tags").unwrap().as_deref(), Some(r#"["z"]"#));
            }

            #[test]
            fn test_remove_reports_existence() {
                let kv = $factory;
                kv.set("settings", "{}").unwrap();
                assert!(kv.remove("settings").unwrap());
                assert!(!kv.remove("settings").unwrap());
                assert_eq!(kv.get("settings").unwrap(), None);
            }

            #[test]
            fn test_keys_are_sorted() {
                let kv = $factory;
                for key in ["tags", "posts", "categories"] {
                    kv.set(key, "[]").unwrap();
                }
                assert_eq!(kv.keys().unwrap(), vec!["categories", "posts", "tags"]);
            }

            #[test]
            fn test_unicode_and_large_values() {
                let kv = $factory;
                let body = format!("\"{}\"", "héllo wörld ✓ ".repeat(10_000));
                kv.set("messages", &body).unwrap();
                assert_eq!(kv.get("messages").unwrap().as_deref(), Some(body.as_str()));
            }

            #[test]
            fn test_concurrent_writers_never_tear_values() {
                let kv = $factory;
                let handles: Vec<_> = (0..8)
                    .map(|i| {
                        let kv = kv.clone();
                        std::thread::spawn(move || {
                            for j in 0..20 {
                                kv.set("counter", &format!("[{},{}]", i, j)).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }

                let raw = kv.get("counter").unwrap().unwrap();
                let parsed: Vec<u32> = serde_json::from_str(&raw).unwrap();
                assert_eq!(parsed.len(), 2);
                assert_eq!(parsed[1], 19);
            }
        }
    };
}
