//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - HTTP status and exit code mapping

#![allow(clippy::option_if_let_else)]

use crate::error::YabtError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    DatabaseNotFound,
    DatabaseError,
    CorruptDocument,

    // === Lookup Errors (exit code 3) ===
    BacklogItemNotFound,
    UserNotFound,
    CustomFieldNotFound,
    CommentNotFound,

    // === Validation Errors (exit code 4) ===
    ValidationFailed,
    InvalidState,
    InvalidType,
    CurrentUserRequired,
    Forbidden,

    // === Config Errors (exit code 7) ===
    ConfigError,

    // === I/O Errors (exit code 8) ===
    IoError,
    JsonError,
    YamlError,

    // === Internal Errors (exit code 1) ===
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::CorruptDocument => "CORRUPT_DOCUMENT",
            Self::BacklogItemNotFound => "BACKLOG_ITEM_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::CustomFieldNotFound => "CUSTOM_FIELD_NOT_FOUND",
            Self::CommentNotFound => "COMMENT_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidType => "INVALID_TYPE",
            Self::CurrentUserRequired => "CURRENT_USER_REQUIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller might succeed by fixing the input and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed
                | Self::InvalidState
                | Self::InvalidType
                | Self::CurrentUserRequired
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 3: Lookup errors
    /// - 4: Validation and access errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseNotFound | Self::DatabaseError | Self::CorruptDocument => 2,
            Self::BacklogItemNotFound
            | Self::UserNotFound
            | Self::CustomFieldNotFound
            | Self::CommentNotFound => 3,
            Self::ValidationFailed
            | Self::InvalidState
            | Self::InvalidType
            | Self::CurrentUserRequired
            | Self::Forbidden => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }

    /// HTTP status code for API responses.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::BacklogItemNotFound
            | Self::UserNotFound
            | Self::CustomFieldNotFound
            | Self::CommentNotFound => 404,
            Self::ValidationFailed | Self::InvalidState | Self::InvalidType => 400,
            Self::CurrentUserRequired => 401,
            Self::Forbidden => 403,
            Self::DatabaseNotFound
            | Self::DatabaseError
            | Self::CorruptDocument
            | Self::ConfigError
            | Self::IoError
            | Self::JsonError
            | Self::YamlError
            | Self::InternalError => 500,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `YabtError`.
    #[must_use]
    pub fn from_error(err: &YabtError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &YabtError) -> (ErrorCode, Option<Value>) {
        match err {
            YabtError::DatabaseNotFound { path } => (
                ErrorCode::DatabaseNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            YabtError::Database(_) => (ErrorCode::DatabaseError, None),
            YabtError::CorruptDocument { id, .. } => {
                (ErrorCode::CorruptDocument, Some(json!({"id": id})))
            }
            YabtError::BacklogItemNotFound { id } => {
                (ErrorCode::BacklogItemNotFound, Some(json!({"id": id})))
            }
            YabtError::UserNotFound { id } => (ErrorCode::UserNotFound, Some(json!({"id": id}))),
            YabtError::CustomFieldNotFound { id } => {
                (ErrorCode::CustomFieldNotFound, Some(json!({"id": id})))
            }
            YabtError::CommentNotFound {
                item_id,
                comment_id,
            } => (
                ErrorCode::CommentNotFound,
                Some(json!({"itemId": item_id, "commentId": comment_id})),
            ),
            YabtError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            YabtError::ValidationErrors { errors } => (
                ErrorCode::ValidationFailed,
                Some(json!({
                    "errors": errors.iter()
                        .map(|e| json!({"field": e.field, "message": e.message}))
                        .collect::<Vec<_>>()
                })),
            ),
            YabtError::InvalidState { state } => {
                (ErrorCode::InvalidState, Some(json!({"state": state})))
            }
            YabtError::InvalidType { item_type } => {
                (ErrorCode::InvalidType, Some(json!({"type": item_type})))
            }
            YabtError::CurrentUserRequired => (ErrorCode::CurrentUserRequired, None),
            YabtError::Forbidden { .. } => (ErrorCode::Forbidden, None),
            YabtError::Config(_) => (ErrorCode::ConfigError, None),
            YabtError::Io(_) => (ErrorCode::IoError, None),
            YabtError::Json(_) => (ErrorCode::JsonError, None),
            YabtError::Yaml(_) => (ErrorCode::YamlError, None),
            YabtError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &YabtError) -> Option<String> {
        match err {
            YabtError::InvalidState { state } => detect_state_intent(state)
                .map(|detected| format!("Did you mean '{detected}'?"))
                .or_else(|| err.suggestion().map(str::to_string)),
            YabtError::InvalidType { item_type } => detect_type_intent(item_type)
                .map(|detected| format!("Did you mean '{detected}'?"))
                .or_else(|| err.suggestion().map(str::to_string)),
            _ => err.suggestion().map(str::to_string),
        }
    }
}

/// State synonyms for intent detection.
static STATE_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("open", "new"),
        ("todo", "new"),
        ("wip", "inProgress"),
        ("in_progress", "inProgress"),
        ("in-progress", "inProgress"),
        ("started", "inProgress"),
        ("active", "inProgress"),
        ("complete", "done"),
        ("completed", "done"),
        ("finished", "done"),
        ("resolved", "done"),
        ("wontfix", "closed"),
        ("rejected", "closed"),
        ("idea", "proposed"),
    ]
    .into_iter()
    .collect()
});

/// Type synonyms for intent detection.
static TYPE_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("story", "userStory"),
        ("user_story", "userStory"),
        ("user-story", "userStory"),
        ("defect", "bug"),
        ("issue", "bug"),
        ("enhancement", "feature"),
        ("improvement", "feature"),
        ("ticket", "task"),
        ("chore", "task"),
    ]
    .into_iter()
    .collect()
});

fn detect_state_intent(input: &str) -> Option<&'static str> {
    STATE_SYNONYMS.get(input.trim().to_lowercase().as_str()).copied()
}

fn detect_type_intent(input: &str) -> Option<&'static str> {
    TYPE_SYNONYMS.get(input.trim().to_lowercase().as_str()).copied()
}
