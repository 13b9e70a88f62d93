//! # Shelf
//!
//! Local-first entity stores for small single-user applications (a blog admin,
//! an expense tracker, a chat client) that persist into one key-value store.
//!
//! ## Features
//!
//! - **Entity stores**: ordered in-memory collections mirrored to storage as whole snapshots
//! - **Mutation API**: validated create/update/delete with ids that are never reused
//! - **Filter/Sort/Paginate pipeline**: pure, stable and safe on empty or shrinking results
//! - **Aggregates**: totals, top-N, busiest period and streaks for dashboards
//! - **Change events**: subscribe to a store instead of polling it
//! - **Pluggable storage**: in-memory by default, LMDB behind the `lmdb` feature
//! - **Rates**: cached currency lookups with a static fallback table
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shelf::prelude::*;
//! use serde_json::json;
//!
//! let kv = ShelfConfig::default().open_storage()?;
//! let mut blog = Blog::open(kv, StoreOptions::default());
//!
//! blog.create_post(json!({
//!     "title": "Hello",
//!     "category": "News",
//!     "excerpt": "First post",
//!     "content": "...",
//!     "tags": "intro, news",
//! }))?;
//!
//! let filter = FilterState::default().with_tag("news").with_sort(SortKey::Newest);
//! let page = blog.render(&filter, PageRequest::new(1, 10));
//! println!("{}", page.footer);
//!
//! blog.teardown()?;
//! ```

pub mod apps;
pub mod config;
pub mod core;
pub mod entities;
pub mod rates;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        entity::{Data, Entity, EntityId, Operation},
        error::{Result, ShelfError},
        events::{EventBus, EventEnvelope, StoreEvent},
        field::{FieldFormat, FieldValue},
        query::{DateRange, FilterState, PageRequest, PaginatedResponse, PaginationMeta, SortKey},
        render::{DisplayRow, Render, RenderedPage, format_amount, render_page},
        store::{EntityStore, StoreOptions},
        validation::{EntityValidationConfig, filters, validators},
    };

    // === Pipeline & aggregates ===
    pub use crate::core::aggregate::{self, BucketKey};
    pub use crate::core::pipeline::{filter, paginate, run_pipeline, sort, total_pages};

    // === Macros ===
    pub use crate::impl_entity;

    // === Entities & apps ===
    pub use crate::apps::{Blog, Chat, Ledger, RoomFeed};
    pub use crate::entities::{Expense, Message, Post, Transaction, TransactionKind};

    // === Storage ===
    pub use crate::storage::transfer::{ImportMode, ImportReport, TransferDocument};
    pub use crate::storage::{InMemoryKeyValueStore, KeyValueStore};
    #[cfg(feature = "lmdb")]
    pub use crate::storage::LmdbKeyValueStore;

    // === Rates ===
    pub use crate::rates::{RateProvider, RateService, RateTable, StaticRateProvider};

    // === Config ===
    pub use crate::config::ShelfConfig;

    // === External dependencies ===
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
}
