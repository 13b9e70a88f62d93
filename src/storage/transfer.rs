//! Import and export of whole collections as one JSON document
//!
//! An export bundles a chosen set of storage keys into a
//! [`TransferDocument`]. Importing writes them back either by replacing each
//! key or by merging into what is already stored.

use crate::core::error::{Result, ValidationError};
use crate::storage::{KeyValueStore, read_json, write_json};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format marker written into every export
pub const TRANSFER_FORMAT: &str = "shelf-export";

/// Current export version
pub const TRANSFER_VERSION: u32 = 1;

/// A portable snapshot of several storage keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDocument {
    pub format: String,
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    /// Storage key -> stored JSON document, in export order
    pub collections: IndexMap<String, Value>,
}

impl TransferDocument {
    /// Serialize as pretty JSON for download
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ValidationError::InvalidJson {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Parse an uploaded document
    pub fn from_json(raw: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(raw).map_err(|e| ValidationError::InvalidJson {
            message: e.to_string(),
        })?;
        if doc.format != TRANSFER_FORMAT {
            return Err(ValidationError::FieldError {
                field: "format".to_string(),
                message: format!("expected '{}', got '{}'", TRANSFER_FORMAT, doc.format),
            }
            .into());
        }
        if doc.version > TRANSFER_VERSION {
            return Err(ValidationError::FieldError {
                field: "version".to_string(),
                message: format!("unsupported export version {}", doc.version),
            }
            .into());
        }
        Ok(doc)
    }
}

/// How imported collections combine with stored ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Overwrite each key present in the document
    #[default]
    Replace,
    /// Merge into stored values (records by id, lists by union, objects by key)
    Merge,
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Export `keys` into a transfer document. Missing or unreadable keys are left out.
pub fn export(kv: &dyn KeyValueStore, keys: &[&str]) -> TransferDocument {
    let mut collections = IndexMap::new();
    for key in keys {
        match read_json::<Value>(kv, key) {
            Some(value) => {
                collections.insert((*key).to_string(), value);
            }
            None => tracing::debug!(key, "nothing to export"),
        }
    }

    TransferDocument {
        format: TRANSFER_FORMAT.to_string(),
        version: TRANSFER_VERSION,
        exported_at: Utc::now(),
        collections,
    }
}

/// Write the collections of `doc` into `kv`.
///
/// Keys listed in `protected` are only replaced after `confirm(key)` agrees;
/// a refusal skips the key and leaves the stored value untouched. Merging
/// never asks for confirmation since it does not discard records.
pub fn import<F>(
    kv: &dyn KeyValueStore,
    doc: &TransferDocument,
    mode: ImportMode,
    protected: &[&str],
    confirm: F,
) -> Result<ImportReport>
where
    F: FnMut(&str) -> bool,
{
    import_checked(kv, doc, mode, protected, confirm, |_, _| Ok(()))
}

/// Like [`import`], but every value about to be written is passed to
/// `check` first. Nothing is written unless all values pass.
pub fn import_checked<F, C>(
    kv: &dyn KeyValueStore,
    doc: &TransferDocument,
    mode: ImportMode,
    protected: &[&str],
    mut confirm: F,
    check: C,
) -> Result<ImportReport>
where
    F: FnMut(&str) -> bool,
    C: Fn(&str, &Value) -> Result<()>,
{
    let mut report = ImportReport::default();
    let mut pending: Vec<(&String, Value)> = Vec::with_capacity(doc.collections.len());

    for (key, incoming) in &doc.collections {
        let value = match mode {
            ImportMode::Replace => {
                let existing = kv.get(key)?.is_some();
                if existing && protected.contains(&key.as_str()) && !confirm(key) {
                    tracing::info!(key = %key, "import of protected key declined");
                    report.skipped.push(key.clone());
                    continue;
                }
                incoming.clone()
            }
            ImportMode::Merge => match read_json::<Value>(kv, key) {
                Some(current) => merge_values(current, incoming.clone()),
                None => incoming.clone(),
            },
        };

        if let Err(e) = check(key, &value) {
            tracing::warn!(key = %key, error = %e, "import rejected, nothing written");
            return Err(e);
        }
        pending.push((key, value));
    }

    for (key, value) in pending {
        write_json(kv, key, &value)?;
        report.written.push(key.clone());
    }

    tracing::info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        ?mode,
        "import finished"
    );
    Ok(report)
}

/// Merge `incoming` into `current`.
///
/// - arrays of objects with `id`: incoming records replace same-id records, new ones are appended
/// - other arrays: union keeping first-seen order
/// - objects: shallow merge, incoming keys win
/// - anything else: incoming wins
pub fn merge_values(current: Value, incoming: Value) -> Value {
    match (current, incoming) {
        (Value::Array(mut current), Value::Array(incoming)) => {
            if is_record_list(&current) && is_record_list(&incoming) {
                for record in incoming {
                    match current.iter().position(|c| c.get("id") == record.get("id")) {
                        Some(index) => current[index] = record,
                        None => current.push(record),
                    }
                }
            } else {
                for item in incoming {
                    if !current.contains(&item) {
                        current.push(item);
                    }
                }
            }
            Value::Array(current)
        }
        (Value::Object(mut current), Value::Object(incoming)) => {
            current.extend(incoming);
            Value::Object(current)
        }
        (_, incoming) => incoming,
    }
}

fn is_record_list(items: &[Value]) -> bool {
    items.iter().all(|item| item.get("id").is_some())
}
