//! Blog post

use crate::core::entity::{Data, EntityId, Operation};
use crate::core::field::FieldValue;
use crate::core::render::{DisplayRow, Render, excerpt, reading_time_minutes};
use crate::core::validation::{EntityValidationConfig, filters, validators};
use crate::entities::day_start;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status values understood by [`Post::has_status`]
pub const POST_STATUSES: [&str; 3] = ["published", "draft", "featured"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub category: String,
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_author")]
    pub author: String,
    /// Absent means draft
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub views: u64,
}

fn default_author() -> String {
    "Admin".to_string()
}

crate::impl_entity!(Post, "posts", "post", sample_posts);

impl Data for Post {
    fn title(&self) -> &str {
        &self.title
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["title", "excerpt", "content"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "title" => Some(self.title.clone().into()),
            "category" => Some(self.category.clone().into()),
            "excerpt" => Some(self.excerpt.clone().into()),
            "content" => Some(self.content.clone().into()),
            "author" => Some(self.author.clone().into()),
            "tags" => Some(FieldValue::List(self.tags.clone())),
            "published" => Some(self.published.into()),
            "featured" => Some(self.featured.into()),
            "views" => Some(FieldValue::Integer(self.views as i64)),
            "status" => Some(self.status().into()),
            _ => None,
        }
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn measure(&self) -> f64 {
        self.views as f64
    }

    fn has_status(&self, status: &str) -> bool {
        match status.to_ascii_lowercase().as_str() {
            "published" => self.published,
            "draft" => !self.published,
            "featured" => self.featured,
            _ => false,
        }
    }

    fn validation_config(_operation: Operation) -> EntityValidationConfig {
        EntityValidationConfig::new("post")
            .filter("title", filters::trim())
            .validate("title", validators::required())
            .validate("title", validators::max_length(200))
            .filter("category", filters::trim())
            .validate("category", validators::required())
            .filter("excerpt", filters::trim())
            .validate("excerpt", validators::required())
            .validate("excerpt", validators::max_length(500))
            .validate("content", validators::required())
            .filter("tags", filters::tag_list())
            .validate("tags", validators::string_list())
            .filter("author", filters::trim())
            .filter("author", filters::blank_to_null())
            .filter("views", filters::parse_number())
            .validate("views", validators::non_negative())
    }
}

impl Post {
    /// "published" or "draft"
    pub fn status(&self) -> &'static str {
        if self.published { "published" } else { "draft" }
    }

    pub fn reading_time(&self) -> usize {
        reading_time_minutes(&self.content)
    }
}

impl Render for Post {
    fn to_row(&self) -> DisplayRow {
        let mut badges = vec![self.category.clone(), self.status().to_string()];
        if self.featured {
            badges.push("featured".to_string());
        }
        badges.extend(self.tags.iter().map(|t| format!("#{}", t)));

        DisplayRow {
            id: self.id,
            title: self.title.clone(),
            subtitle: excerpt(&self.excerpt, 120),
            badges,
            meta: vec![
                self.created_at.format("%b %d, %Y").to_string(),
                format!("{} views", self.views),
                format!("{} min read", self.reading_time()),
            ],
        }
    }
}

fn sample_posts() -> Vec<Post> {
    let post = |id: EntityId, at: DateTime<Utc>, title: &str, category: &str, tags: &[&str]| Post {
        id,
        created_at: at,
        updated_at: at,
        title: title.to_string(),
        category: category.to_string(),
        excerpt: format!("A short introduction to {}.", title.to_lowercase()),
        content: format!(
            "{}\n\nThis sample post ships with a fresh installation. Edit or delete it from the admin view.",
            title
        ),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author: default_author(),
        published: true,
        featured: id == 1,
        views: 0,
    };

    vec![
        post(1, day_start(2024, 1, 15), "Getting Started with Rust", "Programming", &["rust", "beginners"]),
        post(2, day_start(2024, 2, 3), "Designing Offline-First Apps", "Architecture", &["offline", "storage"]),
        post(3, day_start(2024, 3, 10), "Writing Better Tests", "Programming", &["testing", "rust"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Entity;
    use serde_json::json;

    #[test]
    fn test_seed_posts_have_unique_ids() {
        let posts = Post::seed();
        assert_eq!(posts.len(), 3);
        let mut ids: Vec<EntityId> = posts.iter().map(|p| p.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let post: Post = serde_json::from_value(json!({
            "id": 1,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "title": "t",
            "category": "c",
            "excerpt": "e",
            "content": "body"
        }))
        .unwrap();
        assert!(post.tags.is_empty());
        assert_eq!(post.author, "Admin");
        assert!(!post.published);
        assert_eq!(post.views, 0);
        assert!(post.has_status("draft"));
    }

    #[test]
    fn test_create_validation_lists_all_required_fields() {
        let err = Post::validation_config(Operation::Create)
            .validate_and_filter(json!({}))
            .unwrap_err();
        assert_eq!(err.fields(), vec!["title", "category", "excerpt", "content"]);
    }

    #[test]
    fn test_row_badges() {
        let post = &Post::seed()[0];
        let row = post.to_row();
        assert_eq!(row.badges[..3], ["Programming", "published", "featured"]);
        assert!(row.badges.contains(&"#rust".to_string()));
        assert_eq!(row.meta[0], "Jan 15, 2024");
    }
}
