//! Shared test harness for storage backend testing
//!
//! Provides `TestRecord` implementing `Entity + Data` with the dimensions the
//! pipeline and aggregates read (category, tags, unit, measure, status), plus
//! helpers for building drafts and fixtures.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

pub mod entity_store_tests;
pub mod kv_store_tests;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use shelf::core::entity::{Data, EntityId, Operation};
use shelf::core::field::FieldValue;
use shelf::core::validation::{EntityValidationConfig, filters, validators};
use shelf::storage::{InMemoryKeyValueStore, KeyValueStore};

// ---------------------------------------------------------------------------
// TestRecord — one record type covering every pipeline dimension
// ---------------------------------------------------------------------------

/// A test record.
///
/// - `title` / `body`: searched by default
/// - `category`, `tags`: classification labels
/// - `unit` + `amount`: measure in a currency
/// - `status`: free-form, compared by the default `has_status`
/// - `day`: the date the record is about
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub day: Option<DateTime<Utc>>,
}

shelf::impl_entity!(TestRecord, "test_records", "test_record");

impl Data for TestRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["title", "body"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "title" => Some(self.title.clone().into()),
            "body" => Some(self.body.clone().into()),
            "category" => Some(self.category.clone().into()),
            "tags" => Some(FieldValue::List(self.tags.clone())),
            "status" => Some(self.status.clone().into()),
            "amount" => Some(self.amount.into()),
            _ => None,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.day.unwrap_or(self.created_at)
    }

    fn category(&self) -> Option<&str> {
        (!self.category.is_empty()).then_some(self.category.as_str())
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    fn measure(&self) -> f64 {
        self.amount
    }

    fn validation_config(_operation: Operation) -> EntityValidationConfig {
        EntityValidationConfig::new("test_record")
            .filter("title", filters::trim())
            .validate("title", validators::required())
            .filter("tags", filters::tag_list())
            .filter("amount", filters::parse_number())
            .validate("amount", validators::non_negative())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn memory_kv() -> Arc<dyn KeyValueStore> {
    Arc::new(InMemoryKeyValueStore::new())
}

/// Midnight UTC on the given day
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A minimal valid draft
pub fn draft(title: &str) -> Value {
    json!({ "title": title })
}

/// A fully populated draft
pub fn full_draft(title: &str, category: &str, tags: &[&str], amount: f64, at: DateTime<Utc>) -> Value {
    json!({
        "title": title,
        "body": format!("about {}", title.to_lowercase()),
        "category": category,
        "tags": tags,
        "amount": amount,
        "day": at,
    })
}

/// Build a record directly, bypassing the store
pub fn record(id: EntityId, title: &str, category: &str, tags: &[&str], at: DateTime<Utc>) -> TestRecord {
    TestRecord {
        id,
        created_at: at,
        updated_at: at,
        title: title.to_string(),
        body: String::new(),
        category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        unit: None,
        amount: 0.0,
        status: String::new(),
        day: None,
    }
}

pub fn ids<T: shelf::core::entity::Entity>(records: &[&T]) -> Vec<EntityId> {
    records.iter().map(|r| r.id()).collect()
}

pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}
