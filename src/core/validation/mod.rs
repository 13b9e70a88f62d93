//! Validation and filtering system
//!
//! Drafts and patches are JSON objects; each entity declares the filters and
//! validators that run over them before a record is built.

pub mod config;
pub mod filters;
pub mod validators;

pub use config::EntityValidationConfig;
