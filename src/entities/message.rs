//! Chat message

use crate::core::entity::{Data, EntityId, Operation};
use crate::core::field::{FieldFormat, FieldValue};
use crate::core::render::{DisplayRow, Render};
use crate::core::validation::{EntityValidationConfig, filters, validators};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub room: String,
    pub author: String,
    pub body: String,
}

crate::impl_entity!(Message, "messages", "message");

impl Data for Message {
    fn title(&self) -> &str {
        &self.body
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["body", "author"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "room" => Some(self.room.clone().into()),
            "author" => Some(self.author.clone().into()),
            "body" => Some(self.body.clone().into()),
            _ => None,
        }
    }

    /// Rooms act as the message category
    fn category(&self) -> Option<&str> {
        Some(&self.room)
    }

    fn validation_config(_operation: Operation) -> EntityValidationConfig {
        EntityValidationConfig::new("message")
            .filter("room", filters::trim())
            .filter("room", filters::lowercase())
            .validate("room", validators::required())
            .validate("room", validators::format(FieldFormat::Slug))
            .filter("author", filters::trim())
            .validate("author", validators::required())
            .validate("author", validators::max_length(40))
            .filter("body", filters::trim())
            .validate("body", validators::required())
            .validate("body", validators::max_length(2000))
    }
}

impl Render for Message {
    fn to_row(&self) -> DisplayRow {
        DisplayRow {
            id: self.id,
            title: self.author.clone(),
            subtitle: self.body.clone(),
            badges: vec![format!("#{}", self.room)],
            meta: vec![self.created_at.format("%H:%M").to_string()],
        }
    }
}
