//! Backlog items: request/response shapes, commands, comments and queries.

pub mod commands;
pub mod comments;
pub mod queries;

use crate::error::{Result, YabtError};
use crate::model::{
    BacklogItem, BacklogItemDetails, BacklogItemHistoryRecord, BacklogItemRelation,
    BacklogItemState, BacklogItemType, BacklogRelationshipType, BugDetails, BugPriority,
    BugSeverity, ChangedByUserReference, Comment, CustomFieldType, DescriptionDetails,
    UserReference, UserStoryDetails,
};
use crate::storage::{DocumentRead, OrderBy, OrderDirection, UserRelation};
use crate::util::id::short_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Body of a backlog item create or full update.
///
/// Fields that do not apply to the item's type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemAddUpdRequest {
    pub title: String,
    #[serde(default)]
    pub estimated_size: Option<f64>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Related item id to relationship type.
    #[serde(default)]
    pub related_items: BTreeMap<String, BacklogRelationshipType>,
    /// Custom field id to value; `null` removes the value.
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,

    #[serde(default)]
    pub severity: Option<BugSeverity>,
    #[serde(default)]
    pub priority: Option<BugPriority>,
    #[serde(default)]
    pub steps_to_reproduce: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl BacklogItemAddUpdRequest {
    /// Type-specific details carried by this request.
    #[must_use]
    pub fn details(&self, item_type: BacklogItemType) -> BacklogItemDetails {
        match item_type {
            BacklogItemType::Bug => BacklogItemDetails::Bug(BugDetails {
                severity: self.severity,
                priority: self.priority,
                steps_to_reproduce: non_blank(self.steps_to_reproduce.as_ref()),
                acceptance_criteria: non_blank(self.acceptance_criteria.as_ref()),
            }),
            BacklogItemType::UserStory => BacklogItemDetails::UserStory(UserStoryDetails {
                acceptance_criteria: non_blank(self.acceptance_criteria.as_ref()),
            }),
            BacklogItemType::Task => BacklogItemDetails::Task(DescriptionDetails {
                description: non_blank(self.description.as_ref()),
            }),
            BacklogItemType::Feature => BacklogItemDetails::Feature(DescriptionDetails {
                description: non_blank(self.description.as_ref()),
            }),
        }
    }
}

impl From<&BacklogItem> for BacklogItemAddUpdRequest {
    /// The request that would leave `item` unchanged.
    fn from(item: &BacklogItem) -> Self {
        let mut request = Self {
            title: item.title.clone(),
            estimated_size: item.estimated_size,
            assignee_id: item.assignee.as_ref().and_then(|a| a.id.clone()),
            tags: item.tags.clone(),
            related_items: item
                .related_items
                .iter()
                .map(|r| (r.related_to.id.clone(), r.link_type))
                .collect(),
            custom_fields: item.custom_fields.clone(),
            ..Self::default()
        };
        match &item.details {
            BacklogItemDetails::Bug(bug) => {
                request.severity = bug.severity;
                request.priority = bug.priority;
                request.steps_to_reproduce.clone_from(&bug.steps_to_reproduce);
                request.acceptance_criteria.clone_from(&bug.acceptance_criteria);
            }
            BacklogItemDetails::UserStory(story) => {
                request.acceptance_criteria.clone_from(&story.acceptance_criteria);
            }
            BacklogItemDetails::Task(d) | BacklogItemDetails::Feature(d) => {
                request.description.clone_from(&d.description);
            }
        }
        request
    }
}

/// A custom field value with its definition's name and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldValue {
    pub id: String,
    pub name: String,
    pub field_type: CustomFieldType,
    pub value: Value,
}

/// The full view of one backlog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemGetResponse {
    pub id: String,
    pub title: String,
    pub state: BacklogItemState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_size: Option<f64>,
    pub assignee: Option<UserReference>,
    pub tags: Vec<String>,
    pub related_items: Vec<BacklogItemRelation>,
    pub custom_fields: Vec<CustomFieldValue>,
    /// Newest first.
    pub comments: Vec<Comment>,
    pub created: Option<ChangedByUserReference>,
    pub last_updated: Option<ChangedByUserReference>,
    /// Oldest first.
    pub history: Vec<BacklogItemHistoryRecord>,
    #[serde(flatten)]
    pub details: BacklogItemDetails,
}

/// One row of a backlog item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemListGetResponse {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: BacklogItemType,
    pub state: BacklogItemState,
    pub assignee: Option<UserReference>,
    pub tags: Vec<String>,
    pub comments_count: usize,
    pub created: Option<ChangedByUserReference>,
    pub last_updated: Option<ChangedByUserReference>,
}

impl From<&BacklogItem> for BacklogItemListGetResponse {
    fn from(item: &BacklogItem) -> Self {
        Self {
            id: short_id(&item.id).to_string(),
            title: item.title.clone(),
            item_type: item.item_type(),
            state: item.state,
            assignee: item.assignee.clone(),
            tags: item.tags.clone(),
            comments_count: item.comments.len(),
            created: item.created().map(|r| r.change.clone()),
            last_updated: item.last_updated().map(|r| r.change.clone()),
        }
    }
}

/// Query string of a backlog item list.
///
/// `states` and `tags` are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemListGetRequest {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<BacklogItemType>,
    pub states: Option<String>,
    pub tags: Option<String>,
    pub assigned_user_id: Option<String>,
    pub user_relation: Option<UserRelation>,
    pub order_by: Option<OrderBy>,
    pub order_direction: Option<OrderDirection>,
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
}

impl BacklogItemListGetRequest {
    /// # Errors
    ///
    /// Returns `InvalidState` for an unknown state name.
    pub fn parsed_states(&self) -> Result<Vec<BacklogItemState>> {
        split_list(self.states.as_deref())
            .map(|s| s.parse())
            .collect()
    }

    #[must_use]
    pub fn parsed_tags(&self) -> Vec<String> {
        split_list(self.tags.as_deref()).map(str::to_string).collect()
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItemTagListGetRequest {
    pub search: Option<String>,
    pub max_tags: Option<usize>,
}

pub(crate) fn load_item(reader: &impl DocumentRead, item_id: &str) -> Result<BacklogItem> {
    reader
        .load::<BacklogItem>(item_id)?
        .ok_or_else(|| YabtError::BacklogItemNotFound {
            id: item_id.to_string(),
        })
}
