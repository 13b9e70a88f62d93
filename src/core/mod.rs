//! Core module containing fundamental traits and types for the framework

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod service;
pub mod store;
pub mod validation;

pub use entity::{Data, Entity, EntityId, Operation};
pub use error::{Result, ShelfError};
pub use events::{EventBus, EventEnvelope, StoreEvent};
pub use field::{FieldFormat, FieldValue};
pub use query::{DateRange, FilterState, PageRequest, PaginatedResponse, PaginationMeta, SortKey};
pub use render::{DisplayRow, Render, RenderedPage};
pub use store::{EntityStore, StoreOptions};
