//! Blog/CMS facade: posts plus their taxonomy and site settings

use crate::core::aggregate::{self, BucketKey};
use crate::core::entity::{Data, EntityId};
use crate::core::error::{Result, ValidationError};
use crate::core::events::EventEnvelope;
use crate::core::query::{FilterState, PageRequest, PaginatedResponse};
use crate::core::render::{RenderedPage, render_page};
use crate::core::store::{EntityStore, StoreOptions};
use crate::entities::Post;
use crate::storage::transfer::{self, ImportMode, ImportReport, TransferDocument};
use crate::storage::{KeyValueStore, read_json, write_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

pub const CATEGORIES_KEY: &str = "categories";
pub const TAGS_KEY: &str = "tags";
pub const SETTINGS_KEY: &str = "settings";

/// Keys bundled by [`Blog::export`]
pub const EXPORT_KEYS: [&str; 4] = ["posts", CATEGORIES_KEY, TAGS_KEY, SETTINGS_KEY];

/// Keys whose replacement on import needs confirmation
pub const PROTECTED_KEYS: [&str; 1] = ["posts"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSettings {
    pub title: String,
    pub description: String,
    pub posts_per_page: usize,
    pub theme: String,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            posts_per_page: 6,
            theme: "light".to_string(),
        }
    }
}

/// Dashboard numbers, computed over every post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogStats {
    pub total_posts: usize,
    pub published: usize,
    pub drafts: usize,
    pub featured: usize,
    pub total_views: u64,
    pub categories: usize,
    pub tags: usize,
    pub top_tags: Vec<(String, usize)>,
    /// (id, title, views) of the most viewed posts
    pub popular: Vec<(EntityId, String, u64)>,
    pub busiest_weekday: Option<(String, usize)>,
    pub posts_per_month: f64,
}

pub struct Blog {
    posts: EntityStore<Post>,
    categories: Vec<String>,
    tags: Vec<String>,
    settings: BlogSettings,
}

impl Blog {
    pub fn open(kv: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let posts = EntityStore::open(kv, options);
        let mut blog = Self {
            posts,
            categories: Vec::new(),
            tags: Vec::new(),
            settings: BlogSettings::default(),
        };
        blog.load_side_collections();
        blog
    }

    /// Persist everything and release the stores
    pub fn teardown(self) -> Result<()> {
        self.save_taxonomy()?;
        write_json(self.kv().as_ref(), SETTINGS_KEY, &self.settings)?;
        self.posts.teardown()
    }

    fn kv(&self) -> &Arc<dyn KeyValueStore> {
        self.posts.kv()
    }

    /// Taxonomy and settings fail soft like the posts: a missing list is
    /// rebuilt from the posts, missing settings take their defaults.
    fn load_side_collections(&mut self) {
        let kv = self.kv().clone();

        self.categories = read_json(kv.as_ref(), CATEGORIES_KEY).unwrap_or_else(|| {
            let derived = aggregate::distinct_categories(self.posts.list());
            persist_soft(kv.as_ref(), CATEGORIES_KEY, &derived);
            derived
        });
        self.tags = read_json(kv.as_ref(), TAGS_KEY).unwrap_or_else(|| {
            let derived = aggregate::distinct_tags(self.posts.list());
            persist_soft(kv.as_ref(), TAGS_KEY, &derived);
            derived
        });
        self.settings = read_json(kv.as_ref(), SETTINGS_KEY).unwrap_or_else(|| {
            let defaults = BlogSettings::default();
            persist_soft(kv.as_ref(), SETTINGS_KEY, &defaults);
            defaults
        });
    }

    pub fn posts(&self) -> &EntityStore<Post> {
        &self.posts
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn settings(&self) -> &BlogSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.posts.subscribe()
    }

    // === Posts ===

    /// Create a post and register its category and tags.
    ///
    /// Once the post is saved the call succeeds; a failed taxonomy write is
    /// logged and retried by the next taxonomy save or [`Blog::teardown`].
    pub fn create_post(&mut self, draft: Value) -> Result<Post> {
        let post = self.posts.create(draft)?;
        self.register_taxonomy(&post);
        Ok(post)
    }

    pub fn update_post(&mut self, id: EntityId, patch: Value) -> Result<Post> {
        let post = self.posts.update(id, patch)?;
        self.register_taxonomy(&post);
        Ok(post)
    }

    pub fn delete_post(&mut self, id: EntityId) -> Result<Post> {
        self.posts.delete(id)
    }

    pub fn set_published(&mut self, id: EntityId, published: bool) -> Result<Post> {
        self.posts.update(id, serde_json::json!({ "published": published }))
    }

    pub fn set_featured(&mut self, id: EntityId, featured: bool) -> Result<Post> {
        self.posts.update(id, serde_json::json!({ "featured": featured }))
    }

    /// Count a reader view
    pub fn record_view(&mut self, id: EntityId) -> Result<Post> {
        let views = self.posts.get(id).map(|p| p.views).unwrap_or_default();
        self.posts.update(id, serde_json::json!({ "views": views + 1 }))
    }

    fn register_taxonomy(&mut self, post: &Post) {
        let mut changed = push_unique(&mut self.categories, &post.category);
        for tag in &post.tags {
            changed |= push_unique(&mut self.tags, tag);
        }
        if !changed {
            return;
        }
        if let Err(e) = self.save_taxonomy() {
            tracing::warn!(post = post.id, error = %e, "post saved but taxonomy write failed");
        }
    }

    fn save_taxonomy(&self) -> Result<()> {
        write_json(self.kv().as_ref(), CATEGORIES_KEY, &self.categories)?;
        write_json(self.kv().as_ref(), TAGS_KEY, &self.tags)
    }

    // === Taxonomy ===

    /// Add a category; `false` when it already exists (ignoring case)
    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        let name = label(name, "category")?;
        if !push_unique(&mut self.categories, &name) {
            return Ok(false);
        }
        write_json(self.kv().as_ref(), CATEGORIES_KEY, &self.categories)?;
        Ok(true)
    }

    /// Remove a category from the list, ignoring case.
    ///
    /// Posts keep their category string even when it no longer exists in
    /// the list.
    pub fn delete_category(&mut self, name: &str) -> Result<bool> {
        let before = self.categories.len();
        self.categories.retain(|c| !c.eq_ignore_ascii_case(name));
        if self.categories.len() == before {
            return Ok(false);
        }
        write_json(self.kv().as_ref(), CATEGORIES_KEY, &self.categories)?;
        tracing::debug!(category = name, "category deleted, posts left untouched");
        Ok(true)
    }

    pub fn add_tag(&mut self, name: &str) -> Result<bool> {
        let name = label(name, "tag")?;
        if !push_unique(&mut self.tags, &name) {
            return Ok(false);
        }
        write_json(self.kv().as_ref(), TAGS_KEY, &self.tags)?;
        Ok(true)
    }

    /// Remove a tag (ignoring case) from the list and strip it from every post.
    ///
    /// The posts are saved once. Returns the number of posts changed. When
    /// the posts are saved but the tag list write fails, the list is still
    /// updated in memory and written again on the next taxonomy save.
    pub fn delete_tag(&mut self, name: &str) -> Result<usize> {
        let stripped = self.posts.update_where(
            |post| post.tags.iter().any(|t| t.eq_ignore_ascii_case(name)),
            |post| {
                post.tags.retain(|t| !t.eq_ignore_ascii_case(name));
                true
            },
        )?;

        let before = self.tags.len();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(name));
        if self.tags.len() != before {
            persist_soft(self.kv().as_ref(), TAGS_KEY, &self.tags);
        }
        tracing::debug!(tag = name, posts = stripped, "tag deleted");
        Ok(stripped)
    }

    // === Views ===

    pub fn query(&self, filter: &FilterState, page: PageRequest) -> PaginatedResponse<Post> {
        self.posts.query(filter, page)
    }

    /// Published posts for the reader view, newest first
    pub fn reader_page(&self, search: &str, page: usize) -> PaginatedResponse<Post> {
        let filter = FilterState::default()
            .with_status("published")
            .with_search(search)
            .with_sort(crate::core::query::SortKey::Newest);
        self.query(&filter, PageRequest::new(page, self.settings.posts_per_page))
    }

    pub fn render(&self, filter: &FilterState, page: PageRequest) -> RenderedPage {
        render_page(&self.query(filter, page))
    }

    pub fn stats(&self) -> BlogStats {
        let posts = self.posts.list();
        let published = posts.iter().filter(|p| p.published).count();
        let frequency = aggregate::tag_frequency(posts);

        BlogStats {
            total_posts: aggregate::count(posts),
            published,
            drafts: posts.len() - published,
            featured: posts.iter().filter(|p| p.featured).count(),
            total_views: posts.iter().map(|p| p.views).sum(),
            categories: self.categories.len(),
            tags: self.tags.len(),
            top_tags: aggregate::top_n_by_frequency(&frequency, 5),
            popular: aggregate::top_n_by_measure(posts, 5)
                .into_iter()
                .map(|p| (p.id, p.title().to_string(), p.views))
                .collect(),
            busiest_weekday: aggregate::busiest_bucket(&aggregate::bucket_counts(posts, BucketKey::Weekday)),
            posts_per_month: aggregate::average_per_month(posts),
        }
    }

    // === Settings ===

    /// Shallow-merge `patch` into the settings
    pub fn update_settings(&mut self, patch: Value) -> Result<&BlogSettings> {
        let Value::Object(patch) = patch else {
            return Err(ValidationError::InvalidJson {
                message: "settings patch must be a JSON object".to_string(),
            }
            .into());
        };
        let mut merged = match serde_json::to_value(&self.settings) {
            Ok(Value::Object(object)) => object,
            _ => serde_json::Map::new(),
        };
        merged.extend(patch);

        let settings: BlogSettings = serde_json::from_value(Value::Object(merged)).map_err(|e| {
            ValidationError::InvalidJson {
                message: format!("invalid settings: {}", e),
            }
        })?;
        if settings.posts_per_page == 0 {
            return Err(ValidationError::FieldError {
                field: "posts_per_page".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }

        write_json(self.kv().as_ref(), SETTINGS_KEY, &settings)?;
        self.settings = settings;
        Ok(&self.settings)
    }

    // === Import / export ===

    pub fn export(&self) -> TransferDocument {
        transfer::export(self.kv().as_ref(), &EXPORT_KEYS)
    }

    /// Import a document; replacing existing posts asks `confirm` first.
    ///
    /// Only the blog's own keys are taken from the document. Every resulting
    /// collection must decode as its typed form, otherwise the import fails
    /// and storage is left untouched.
    pub fn import<F>(&mut self, doc: &TransferDocument, mode: ImportMode, confirm: F) -> Result<ImportReport>
    where
        F: FnMut(&str) -> bool,
    {
        let mut scoped = doc.clone();
        scoped.collections.retain(|key, _| EXPORT_KEYS.contains(&key.as_str()));

        let report = transfer::import_checked(
            self.kv().as_ref(),
            &scoped,
            mode,
            &PROTECTED_KEYS,
            confirm,
            check_collection,
        )?;
        if report.written.iter().any(|k| k == "posts") {
            self.posts.reload();
        }
        self.load_side_collections();
        Ok(report)
    }
}

/// Reject a value that would not load back as the blog's typed collection
fn check_collection(key: &str, value: &Value) -> Result<()> {
    let decoded = match key {
        CATEGORIES_KEY | TAGS_KEY => Vec::<String>::deserialize(value).map(drop),
        SETTINGS_KEY => BlogSettings::deserialize(value).map(drop),
        _ => Vec::<Post>::deserialize(value).map(drop),
    };
    decoded.map_err(|e| {
        ValidationError::FieldError {
            field: key.to_string(),
            message: format!("cannot be imported: {}", e),
        }
        .into()
    })
}

fn label(name: &str, field: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::FieldError {
            field: field.to_string(),
            message: "is required".to_string(),
        }
        .into());
    }
    Ok(name.to_string())
}

/// Append `value` unless present (ignoring case); returns whether it was added
fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    if value.is_empty() || list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        return false;
    }
    list.push(value.to_string());
    true
}

fn persist_soft<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = write_json(kv, key, value) {
        tracing::warn!(key, error = %e, "write failed, keeping the in-memory value");
    }
}
