//! Error types and handling for `yabt`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Wraps `anyhow` errors in a catch-all variant
//! - Provides recovery hints for user-facing errors
//! - Maps every error to an HTTP status and a CLI exit code

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `yabt` operations.
#[derive(Error, Debug)]
pub enum YabtError {
    // === Storage Errors ===
    /// Database file could not be opened.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored document could not be decoded into its type.
    #[error("Corrupt document '{id}': {reason}")]
    CorruptDocument { id: String, reason: String },

    // === Lookup Errors ===
    /// Backlog item with the specified ID was not found.
    #[error("Backlog item not found: {id}")]
    BacklogItemNotFound { id: String },

    /// User with the specified ID was not found.
    #[error("User not found: {id}")]
    UserNotFound { id: String },

    /// Custom field with the specified ID was not found.
    #[error("Custom field not found: {id}")]
    CustomFieldNotFound { id: String },

    /// Comment with the specified ID was not found on the item.
    #[error("Comment not found: {comment_id} on {item_id}")]
    CommentNotFound { item_id: String, comment_id: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Invalid backlog item state value.
    #[error("Invalid state: {state}")]
    InvalidState { state: String },

    /// Invalid backlog item type value.
    #[error("Invalid backlog item type: {item_type}")]
    InvalidType { item_type: String },

    // === Access Errors ===
    /// The operation needs an acting user and none was supplied.
    #[error("Current user required")]
    CurrentUserRequired,

    /// The acting user is not allowed to perform this operation.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl YabtError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CurrentUserRequired => {
                Some("Pass --user, set YABT_CURRENT_USER, or send an X-User-Id header")
            }
            Self::UserNotFound { .. } => Some("List users with: yabt user list"),
            Self::BacklogItemNotFound { .. } => Some("List items with: yabt item list"),
            Self::CustomFieldNotFound { .. } => Some("List custom fields with: yabt field list"),
            Self::InvalidState { .. } => {
                Some("Valid states: proposed, new, ready, inProgress, done, closed")
            }
            Self::InvalidType { .. } => Some("Valid types: bug, userStory, task, feature"),
            Self::Forbidden { .. } => Some("Only the author of a comment can change it"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(mut errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = errors.remove(0);
            Self::Validation {
                field: err.field,
                reason: err.message,
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `YabtError`.
pub type Result<T> = std::result::Result<T, YabtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = YabtError::BacklogItemNotFound {
            id: "BacklogItems/1-A".to_string(),
        };
        assert_eq!(err.to_string(), "Backlog item not found: BacklogItems/1-A");
    }

    #[test]
    fn test_validation_error() {
        let err = YabtError::validation("title", "cannot be empty");
        assert_eq!(err.to_string(), "Validation failed: title: cannot be empty");
    }

    #[test]
    fn test_single_validation_error_collapses() {
        let err = YabtError::from_validation_errors(vec![ValidationError::new(
            "email",
            "must contain '@'",
        )]);
        assert!(matches!(err, YabtError::Validation { ref field, .. } if field == "email"));

        let err = YabtError::from_validation_errors(vec![
            ValidationError::new("email", "must contain '@'"),
            ValidationError::new("firstName", "cannot be empty"),
        ]);
        assert!(matches!(err, YabtError::ValidationErrors { ref errors } if errors.len() == 2));
    }

    #[test]
    fn test_suggestion() {
        assert!(YabtError::CurrentUserRequired.suggestion().is_some());
        assert_eq!(YabtError::Config("x".into()).suggestion(), None);
    }
}
