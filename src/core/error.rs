//! Typed error handling for shelf
//!
//! Nothing in this crate is fatal. Every failure ends as one of:
//! - a refused operation with no mutation ([`ValidationError`], [`EntityError`])
//! - a fallback value substituted by the caller ([`StorageError`], [`ExternalServiceError`])
//!
//! The error carries enough structure to build a user-visible, non-blocking
//! notice through [`ShelfError::to_notice`].
//!
//! # Example
//!
//! ```rust,ignore
//! match blog.posts_mut().delete(42) {
//!     Ok(post) => println!("deleted {}", post.title),
//!     Err(ShelfError::Entity(EntityError::NotFound { id, .. })) => {
//!         println!("post {} was already gone", id);
//!     }
//!     Err(e) => eprintln!("{}", e.to_notice().message),
//! }
//! ```

use crate::core::entity::EntityId;
use serde::Serialize;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ShelfError>;

/// The main error type for shelf
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Entity lookups that referenced a missing id
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Missing or invalid input; the operation was aborted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Key-value backend or (de)serialization failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Third-party lookup failure (rates)
    #[error(transparent)]
    External(#[from] ExternalServiceError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// User-visible notice built from an error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorNotice {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ShelfError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ShelfError::Entity(e) => e.error_code(),
            ShelfError::Validation(_) => "VALIDATION_ERROR",
            ShelfError::Storage(_) => "STORAGE_ERROR",
            ShelfError::External(_) => "EXTERNAL_SERVICE_ERROR",
            ShelfError::Config(_) => "CONFIG_ERROR",
            ShelfError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to a notice suitable for a toast or inline message
    pub fn to_notice(&self) -> ErrorNotice {
        ErrorNotice {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// True for errors that mean "the referenced record does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShelfError::Entity(EntityError::NotFound { .. }))
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ShelfError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id
                }))
            }
            ShelfError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entity lookups
#[derive(Debug, Error)]
pub enum EntityError {
    /// Entity was not found
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: EntityId },
}

impl EntityError {
    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Single field validation error
    #[error("Validation error for field '{field}': {message}")]
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    #[error("Validation errors: {}", join_field_errors(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Invalid JSON payload
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

fn join_field_errors(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Names of every field that failed validation, in report order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ValidationError::FieldError { field, .. } => vec![field.as_str()],
            ValidationError::FieldErrors(errors) => {
                errors.iter().map(|e| e.field.as_str()).collect()
            }
            ValidationError::InvalidJson { .. } => Vec::new(),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refused a read or write
    #[error("{backend} error: {message}")]
    Backend { backend: String, message: String },

    /// A value could not be encoded or decoded
    #[error("Failed to (de)serialize '{key}': {message}")]
    Serialization { key: String, message: String },

    /// Backend not available
    #[error("Storage backend '{backend}' is unavailable")]
    Unavailable { backend: String },
}

// =============================================================================
// External Service Errors
// =============================================================================

/// Errors raised by third-party lookups
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    /// Network or transport failure
    #[error("{service} request failed: {message}")]
    Request { service: String, message: String },

    /// The service answered with something we could not use
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse { service: String, message: String },

    /// No endpoint configured
    #[error("{service} is not configured")]
    NotConfigured { service: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}
