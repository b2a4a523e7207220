//! Custom field definitions.

use crate::error::{Result, YabtError};
use crate::model::{BacklogItemType, CustomField, CustomFieldType};
use crate::storage::{DocumentRead, DocumentStore, IndexPredicate, PatchAction, PatchQuery};
use crate::util::id::{normalize_id, short_id};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldAddRequest {
    pub name: String,
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub backlog_item_types: Vec<BacklogItemType>,
}

/// The field type cannot change once values exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldUpdRequest {
    pub name: String,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default)]
    pub backlog_item_types: Vec<BacklogItemType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldListGetRequest {
    /// Only fields applicable to this item type.
    #[serde(rename = "backlogItemType")]
    pub item_type: Option<BacklogItemType>,
    pub is_mandatory: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldListGetResponse {
    pub id: String,
    pub name: String,
    pub field_type: CustomFieldType,
    pub is_mandatory: bool,
    pub backlog_item_types: Vec<BacklogItemType>,
}

impl From<&CustomField> for CustomFieldListGetResponse {
    fn from(field: &CustomField) -> Self {
        Self {
            id: short_id(&field.id).to_string(),
            name: field.name.clone(),
            field_type: field.field_type,
            is_mandatory: field.is_mandatory,
            backlog_item_types: field.backlog_item_types.clone(),
        }
    }
}

fn validate_name(reader: &impl DocumentRead, name: &str, self_id: Option<&str>) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(YabtError::validation("name", "cannot be empty"));
    }
    let taken = reader.query_all::<CustomField>()?.iter().any(|other| {
        other.name.trim().eq_ignore_ascii_case(name)
            && self_id.is_none_or(|id| normalize_id(id) != normalize_id(&other.id))
    });
    if taken {
        return Err(YabtError::validation("name", format!("'{name}' is already in use")));
    }
    Ok(name.to_string())
}

fn dedup_types(types: &[BacklogItemType]) -> Vec<BacklogItemType> {
    let mut out = Vec::with_capacity(types.len());
    for t in types {
        if !out.contains(t) {
            out.push(*t);
        }
    }
    out
}

/// # Errors
///
/// Returns a validation error for a blank or duplicate name.
pub fn create(store: &mut DocumentStore, request: &CustomFieldAddRequest) -> Result<CustomFieldListGetResponse> {
    let field = store.mutate("create_custom_field", |session| {
        let mut field = CustomField {
            id: String::new(),
            name: validate_name(session, &request.name, None)?,
            field_type: request.field_type,
            is_mandatory: request.is_mandatory,
            backlog_item_types: dedup_types(&request.backlog_item_types),
        };
        session.store(&mut field)?;
        Ok(field)
    })?;
    info!(id = %field.id, name = %field.name, "Created custom field");
    Ok(CustomFieldListGetResponse::from(&field))
}

/// # Errors
///
/// Returns `CustomFieldNotFound` or a validation error.
pub fn update(
    store: &mut DocumentStore,
    field_id: &str,
    request: &CustomFieldUpdRequest,
) -> Result<CustomFieldListGetResponse> {
    let field = store.mutate("update_custom_field", |session| {
        let mut field = session
            .load::<CustomField>(field_id)?
            .ok_or_else(|| YabtError::CustomFieldNotFound {
                id: field_id.to_string(),
            })?;
        field.name = validate_name(session, &request.name, Some(&field.id))?;
        field.is_mandatory = request.is_mandatory;
        field.backlog_item_types = dedup_types(&request.backlog_item_types);
        session.store(&mut field)?;
        Ok(field)
    })?;
    info!(id = %field.id, "Updated custom field");
    Ok(CustomFieldListGetResponse::from(&field))
}

/// Delete a field definition and strip its values from every item.
///
/// # Errors
///
/// Returns `CustomFieldNotFound` when there is no such field.
pub fn delete(store: &mut DocumentStore, field_id: &str) -> Result<String> {
    let id = store.mutate("delete_custom_field", |session| {
        let field = session
            .load::<CustomField>(field_id)?
            .ok_or_else(|| YabtError::CustomFieldNotFound {
                id: field_id.to_string(),
            })?;
        session.delete::<CustomField>(&field.id)?;
        let short = short_id(&field.id).to_string();
        session.add_deferred_patch(PatchQuery::new(
            IndexPredicate::HasCustomField(short.clone()),
            PatchAction::RemoveCustomField(short.clone()),
        ));
        Ok(short)
    })?;
    info!(id = %id, "Deleted custom field");
    Ok(id)
}

/// # Errors
///
/// Returns `CustomFieldNotFound` when there is no such field.
pub fn get(reader: &impl DocumentRead, field_id: &str) -> Result<CustomFieldListGetResponse> {
    reader
        .load::<CustomField>(field_id)?
        .map(|field| CustomFieldListGetResponse::from(&field))
        .ok_or_else(|| YabtError::CustomFieldNotFound {
            id: field_id.to_string(),
        })
}

/// Field definitions ordered by name.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list(
    reader: &impl DocumentRead,
    request: &CustomFieldListGetRequest,
) -> Result<Vec<CustomFieldListGetResponse>> {
    let mut fields: Vec<CustomField> = reader
        .query_all::<CustomField>()?
        .into_iter()
        .filter(|f| request.item_type.is_none_or(|t| f.applies_to(t)))
        .filter(|f| request.is_mandatory.is_none_or(|m| f.is_mandatory == m))
        .collect();
    fields.sort_by_cached_key(|f| f.name.to_lowercase());
    Ok(fields.iter().map(CustomFieldListGetResponse::from).collect())
}
