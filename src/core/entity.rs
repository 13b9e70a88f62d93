//! Entity traits defining the core abstraction for all record types

use crate::core::field::FieldValue;
use crate::core::validation::EntityValidationConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Identifier of a record within its collection.
///
/// Issued by a monotonic counter and never reused after deletion.
pub type EntityId = u64;

/// Which mutation a validation config applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Base trait for every record kept in an [`EntityStore`](crate::core::store::EntityStore).
///
/// All entities have:
/// - id: Unique identifier, assigned at creation
/// - created_at: Creation timestamp
/// - updated_at: Bumped by every mutation
///
/// The store builds and patches records through their JSON form, so the
/// serialized field names `id`, `created_at` and `updated_at` are part of the
/// contract. Use [`impl_entity!`](crate::impl_entity) to implement this trait.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The storage key of the collection (e.g., "posts")
    fn resource_name() -> &'static str;

    /// The singular name used in messages (e.g., "post")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> EntityId;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Bump the last update timestamp
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Sample records written on first load when storage holds nothing usable
    fn seed() -> Vec<Self> {
        Vec::new()
    }
}

/// Trait for records that take part in the filter/sort/paginate pipeline
/// and in dashboard aggregates.
///
/// Only `title`, `indexed_fields` and `field_value` are mandatory; the
/// remaining accessors default to "this record has no such dimension".
pub trait Data: Entity {
    /// Human-readable title (post title, expense name, message body)
    fn title(&self) -> &str;

    /// Fields searched by free-text queries unless the filter names its own
    fn indexed_fields() -> &'static [&'static str];

    /// Get the value of a specific field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Date the record is about; drives date sorting, ranges and buckets
    fn occurred_at(&self) -> DateTime<Utc> {
        self.created_at()
    }

    fn category(&self) -> Option<&str> {
        None
    }

    fn tags(&self) -> &[String] {
        &[]
    }

    /// Unit of [`Data::measure`], typically a currency code
    fn unit(&self) -> Option<&str> {
        None
    }

    /// Numeric measure used by "popular" sorting and sums (views, amount)
    fn measure(&self) -> f64 {
        0.0
    }

    /// Status equality; defaults to comparing the `status` field
    fn has_status(&self, status: &str) -> bool {
        matches!(
            self.field_value("status"),
            Some(FieldValue::String(s)) if s.eq_ignore_ascii_case(status)
        )
    }

    /// Validation applied to drafts and patches
    fn validation_config(_operation: Operation) -> EntityValidationConfig {
        EntityValidationConfig::new(Self::resource_name_singular())
    }
}
