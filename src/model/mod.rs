//! Core data types for `yabt`.
//!
//! This module defines the documents stored by the application:
//! - `BacklogItem` - The ticket, with its type-specific details
//! - `User` - A person who can be assigned, comment, and change items
//! - `CustomField` - A user-defined extra property of backlog items
//!
//! and the denormalized records embedded inside backlog items:
//! - `UserReference` - id + display names of a user
//! - `Comment` - a remark on an item
//! - `BacklogItemHistoryRecord` - one entry of the change log
//! - `BacklogItemRelation` - a typed link to another item

mod references;

use crate::error::YabtError;
use crate::util::id::normalize_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Backlog item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BacklogItemType {
    Bug,
    UserStory,
    Task,
    Feature,
}

impl BacklogItemType {
    pub const ALL: [Self; 4] = [Self::Bug, Self::UserStory, Self::Task, Self::Feature];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::UserStory => "userStory",
            Self::Task => "task",
            Self::Feature => "feature",
        }
    }
}

impl fmt::Display for BacklogItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BacklogItemType {
    type Err = YabtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bug" => Ok(Self::Bug),
            "userstory" => Ok(Self::UserStory),
            "task" => Ok(Self::Task),
            "feature" => Ok(Self::Feature),
            _ => Err(YabtError::InvalidType {
                item_type: s.to_string(),
            }),
        }
    }
}

/// Backlog item workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BacklogItemState {
    Proposed,
    #[default]
    New,
    Ready,
    InProgress,
    Done,
    Closed,
}

impl BacklogItemState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::New => "new",
            Self::Ready => "ready",
            Self::InProgress => "inProgress",
            Self::Done => "done",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for BacklogItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BacklogItemState {
    type Err = YabtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proposed" => Ok(Self::Proposed),
            "new" => Ok(Self::New),
            "ready" => Ok(Self::Ready),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "closed" => Ok(Self::Closed),
            _ => Err(YabtError::InvalidState {
                state: s.to_string(),
            }),
        }
    }
}

/// Bug severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BugSeverity {
    Critical,
    Major,
    Minor,
    Trivial,
}

impl FromStr for BugSeverity {
    type Err = YabtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "trivial" => Ok(Self::Trivial),
            _ => Err(YabtError::validation(
                "severity",
                "expected critical, major, minor or trivial",
            )),
        }
    }
}

/// Bug priority (P1 is the most urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BugPriority {
    P1,
    P2,
    P3,
    P4,
}

impl FromStr for BugPriority {
    type Err = YabtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();
        match s.strip_prefix('P').unwrap_or(&s) {
            "1" => Ok(Self::P1),
            "2" => Ok(Self::P2),
            "3" => Ok(Self::P3),
            "4" => Ok(Self::P4),
            _ => Err(YabtError::validation("priority", "expected P1-P4")),
        }
    }
}

/// Link type between two backlog items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BacklogRelationshipType {
    Duplicate,
    Related,
    BlockedBy,
    Blocks,
    CausedBy,
    Causes,
}

impl BacklogRelationshipType {
    /// The link type recorded on the other end of the relation.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Duplicate => Self::Duplicate,
            Self::Related => Self::Related,
            Self::BlockedBy => Self::Blocks,
            Self::Blocks => Self::BlockedBy,
            Self::CausedBy => Self::Causes,
            Self::Causes => Self::CausedBy,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Related => "related",
            Self::BlockedBy => "blockedBy",
            Self::Blocks => "blocks",
            Self::CausedBy => "causedBy",
            Self::Causes => "causes",
        }
    }
}

impl FromStr for BacklogRelationshipType {
    type Err = YabtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "duplicate" => Ok(Self::Duplicate),
            "related" => Ok(Self::Related),
            "blockedby" => Ok(Self::BlockedBy),
            "blocks" => Ok(Self::Blocks),
            "causedby" => Ok(Self::CausedBy),
            "causes" => Ok(Self::Causes),
            _ => Err(YabtError::validation(
                "relatedItems",
                format!("unknown relationship type '{s}'"),
            )),
        }
    }
}

/// Data type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomFieldType {
    Text,
    Numeric,
    Date,
    Checkbox,
    Url,
}

impl CustomFieldType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Numeric => "numeric",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
        }
    }

    /// Check that a JSON value fits this field type.
    ///
    /// # Errors
    ///
    /// Returns a short reason when the value does not fit.
    pub fn check_value(self, value: &Value) -> Result<(), String> {
        match (self, value) {
            (Self::Text, Value::String(_))
            | (Self::Numeric, Value::Number(_))
            | (Self::Checkbox, Value::Bool(_)) => Ok(()),
            (Self::Date, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|_| ())
                .map_err(|_| "expected an RFC 3339 date".to_string()),
            (Self::Url, Value::String(s)) => {
                if s.starts_with("http://") || s.starts_with("https://") {
                    Ok(())
                } else {
                    Err("expected an http(s) URL".to_string())
                }
            }
            (field_type, _) => Err(format!("expected a {} value", field_type.as_str())),
        }
    }
}

impl FromStr for CustomFieldType {
    type Err = YabtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "numeric" | "number" => Ok(Self::Numeric),
            "date" => Ok(Self::Date),
            "checkbox" | "bool" => Ok(Self::Checkbox),
            "url" => Ok(Self::Url),
            _ => Err(YabtError::validation(
                "fieldType",
                "expected text, numeric, date, checkbox or url",
            )),
        }
    }
}

/// Denormalized pointer to a user, embedded in backlog items.
///
/// `id` is the user's short id, or `None` once the user has been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserReference {
    #[serde(default)]
    pub id: Option<String>,
    /// Short display name ("Simpson, H.").
    pub name: String,
    #[serde(default)]
    pub full_name: String,
}

impl UserReference {
    /// Does this reference point at `user_id` (case-insensitive, short or full id)?
    #[must_use]
    pub fn points_to(&self, user_id: &str) -> bool {
        self.id
            .as_deref()
            .is_some_and(|id| normalize_id(id) == normalize_id(user_id))
    }
}

/// Who changed something and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangedByUserReference {
    pub timestamp: DateTime<Utc>,
    pub actioned_by: UserReference,
}

/// One entry of a backlog item's change log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemHistoryRecord {
    #[serde(flatten)]
    pub change: ChangedByUserReference,
    /// Brief summary of the change.
    #[serde(default)]
    pub summary: String,
}

/// A comment on a backlog item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub message: String,
    pub author: UserReference,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Denormalized pointer to another backlog item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemReference {
    pub id: String,
    pub name: String,
}

/// A typed link from one backlog item to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemRelation {
    pub related_to: BacklogItemReference,
    pub link_type: BacklogRelationshipType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BugDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<BugSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<BugPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_to_reproduce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStoryDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Type-specific part of a backlog item, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BacklogItemDetails {
    Bug(BugDetails),
    UserStory(UserStoryDetails),
    Task(DescriptionDetails),
    Feature(DescriptionDetails),
}

impl BacklogItemDetails {
    #[must_use]
    pub const fn item_type(&self) -> BacklogItemType {
        match self {
            Self::Bug(_) => BacklogItemType::Bug,
            Self::UserStory(_) => BacklogItemType::UserStory,
            Self::Task(_) => BacklogItemType::Task,
            Self::Feature(_) => BacklogItemType::Feature,
        }
    }

    /// Empty details for the given type.
    #[must_use]
    pub fn empty(item_type: BacklogItemType) -> Self {
        match item_type {
            BacklogItemType::Bug => Self::Bug(BugDetails::default()),
            BacklogItemType::UserStory => Self::UserStory(UserStoryDetails::default()),
            BacklogItemType::Task => Self::Task(DescriptionDetails::default()),
            BacklogItemType::Feature => Self::Feature(DescriptionDetails::default()),
        }
    }
}

/// The ticket document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItem {
    /// Full document id (e.g. "BacklogItems/1-A"); empty until stored.
    #[serde(default)]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub state: BacklogItemState,

    /// Story points or hours, team's choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size: Option<f64>,

    #[serde(default)]
    pub assignee: Option<UserReference>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub comments: Vec<Comment>,

    /// Change log, oldest first. The first record is the creation.
    #[serde(default)]
    pub modified_by: Vec<BacklogItemHistoryRecord>,

    #[serde(default)]
    pub related_items: Vec<BacklogItemRelation>,

    /// Custom field id (short) to value.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub details: BacklogItemDetails,
}

impl BacklogItem {
    /// A fresh, unsaved item.
    #[must_use]
    pub fn new(title: impl Into<String>, details: BacklogItemDetails) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            state: BacklogItemState::default(),
            estimated_size: None,
            assignee: None,
            tags: Vec::new(),
            comments: Vec::new(),
            modified_by: Vec::new(),
            related_items: Vec::new(),
            custom_fields: BTreeMap::new(),
            details,
        }
    }

    #[must_use]
    pub const fn item_type(&self) -> BacklogItemType {
        self.details.item_type()
    }

    /// The creation record.
    #[must_use]
    pub fn created(&self) -> Option<&BacklogItemHistoryRecord> {
        self.modified_by.first()
    }

    /// The most recent change record.
    #[must_use]
    pub fn last_updated(&self) -> Option<&BacklogItemHistoryRecord> {
        self.modified_by.last()
    }

    /// Append a change-log entry actioned by `actor`.
    pub fn add_history_record(&mut self, actor: &UserReference, summary: impl Into<String>) {
        self.modified_by.push(BacklogItemHistoryRecord {
            change: ChangedByUserReference {
                timestamp: Utc::now(),
                actioned_by: actor.clone(),
            },
            summary: summary.into(),
        });
    }

    #[must_use]
    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    #[must_use]
    pub fn relation_to(&self, item_id: &str) -> Option<&BacklogItemRelation> {
        self.related_items
            .iter()
            .find(|r| normalize_id(&r.related_to.id) == normalize_id(item_id))
    }
}

/// A user document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Full document id (e.g. "Users/1-A"); empty until stored.
    #[serde(default)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// "Homer Simpson".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// "Simpson, H." (falls back to the first name when there is no last name).
    #[must_use]
    pub fn name_with_initials(&self) -> String {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        match (first.chars().next(), last.is_empty()) {
            (_, true) => first.to_string(),
            (Some(initial), false) => format!("{last}, {initial}."),
            (None, false) => last.to_string(),
        }
    }

    /// The denormalized reference embedded in other documents.
    #[must_use]
    pub fn reference(&self) -> UserReference {
        UserReference {
            id: Some(crate::util::id::short_id(&self.id).to_string()),
            name: self.name_with_initials(),
            full_name: self.full_name(),
        }
    }
}

/// A user-defined extra property of backlog items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub is_mandatory: bool,
    /// Item types the field applies to; empty means all types.
    #[serde(default)]
    pub backlog_item_types: Vec<BacklogItemType>,
}

impl CustomField {
    #[must_use]
    pub fn applies_to(&self, item_type: BacklogItemType) -> bool {
        self.backlog_item_types.is_empty() || self.backlog_item_types.contains(&item_type)
    }
}
