//! Backlog item commands.
//!
//! Every command runs as one unit of work and appends a history record
//! actioned by the current user.

use super::queries::view;
use super::{BacklogItemAddUpdRequest, BacklogItemGetResponse, load_item};
use crate::error::{Result, ValidationError, YabtError};
use crate::model::{
    BacklogItem, BacklogItemReference, BacklogItemRelation, BacklogItemState, BacklogItemType,
    CustomField, User, UserReference,
};
use crate::services::current_user_reference;
use crate::storage::{
    DocumentRead, DocumentStore, IndexPredicate, PatchAction, PatchQuery, Session,
};
use crate::util::id::{normalize_id, short_id};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

pub const MAX_TITLE_LENGTH: usize = 500;
pub const MAX_TAG_LENGTH: usize = 30;

/// Create an item of the given type.
///
/// # Errors
///
/// Returns `CurrentUserRequired`, a lookup error for a missing assignee,
/// related item or custom field, or a validation error.
pub fn create(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_type: BacklogItemType,
    request: &BacklogItemAddUpdRequest,
) -> Result<BacklogItemGetResponse> {
    let response = store.mutate("create_backlog_item", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let mut item = BacklogItem::new(String::new(), request.details(item_type));
        apply_request(session, &mut item, request)?;
        item.add_history_record(&actor, "Created");
        session.store(&mut item)?;
        sync_relations(session, &actor, &item, &[])?;
        view(session, &item)
    })?;
    info!(id = %response.id, item_type = %item_type, "Created backlog item");
    Ok(response)
}

/// Replace the editable content of an item.
///
/// State, comments and history are kept; the type cannot change.
///
/// # Errors
///
/// Returns `BacklogItemNotFound`, `CurrentUserRequired`, a lookup error or
/// a validation error.
pub fn update(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_id: &str,
    request: &BacklogItemAddUpdRequest,
) -> Result<BacklogItemGetResponse> {
    let response = store.mutate("update_backlog_item", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let mut item = load_item(session, item_id)?;
        let previous = item.related_items.clone();

        item.details = request.details(item.item_type());
        apply_request(session, &mut item, request)?;
        item.add_history_record(&actor, "Updated");
        session.store(&mut item)?;
        sync_relations(session, &actor, &item, &previous)?;
        view(session, &item)
    })?;
    info!(id = %response.id, "Updated backlog item");
    Ok(response)
}

/// Delete an item and the links other items hold to it.
///
/// Returns the deleted item's short id.
///
/// # Errors
///
/// Returns `BacklogItemNotFound` when there is no such item.
pub fn delete(store: &mut DocumentStore, item_id: &str) -> Result<String> {
    let id = store.mutate("delete_backlog_item", |session| {
        let item = load_item(session, item_id)?;
        session.delete::<BacklogItem>(&item.id)?;
        let short = short_id(&item.id).to_string();
        session.add_deferred_patch(PatchQuery::new(
            IndexPredicate::RelatedTo(short.clone()),
            PatchAction::RemoveRelationsTo(short.clone()),
        ));
        Ok(short)
    })?;
    info!(id = %id, "Deleted backlog item");
    Ok(id)
}

/// # Errors
///
/// Returns `BacklogItemNotFound` or `CurrentUserRequired`.
pub fn set_state(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_id: &str,
    state: BacklogItemState,
) -> Result<BacklogItemGetResponse> {
    store.mutate("set_backlog_item_state", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let mut item = load_item(session, item_id)?;
        if item.state != state {
            item.state = state;
            item.add_history_record(&actor, format!("Changed state to '{state}'"));
            session.store(&mut item)?;
        }
        view(session, &item)
    })
}

/// Assign an item to a user, or unassign it with `None`.
///
/// # Errors
///
/// Returns `BacklogItemNotFound`, `UserNotFound` or `CurrentUserRequired`.
pub fn assign(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_id: &str,
    user_id: Option<&str>,
) -> Result<BacklogItemGetResponse> {
    store.mutate("assign_backlog_item", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let mut item = load_item(session, item_id)?;
        let assignee = resolve_assignee(session, user_id)?;

        if item.assignee != assignee {
            let summary = assignee
                .as_ref()
                .map_or_else(|| "Unassigned".to_string(), |a| format!("Assigned to {}", a.full_name));
            item.assignee = assignee;
            item.add_history_record(&actor, summary);
            session.store(&mut item)?;
        }
        view(session, &item)
    })
}

fn resolve_assignee(reader: &impl DocumentRead, user_id: Option<&str>) -> Result<Option<UserReference>> {
    let Some(user_id) = user_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };
    let user = reader
        .load::<User>(user_id)?
        .ok_or_else(|| YabtError::UserNotFound {
            id: user_id.to_string(),
        })?;
    Ok(Some(user.reference()))
}

/// Validate a request and copy it onto the item (all but details and history).
fn apply_request(
    session: &Session<'_>,
    item: &mut BacklogItem,
    request: &BacklogItemAddUpdRequest,
) -> Result<()> {
    let mut errors = Vec::new();

    let title = request.title.trim();
    if title.is_empty() {
        errors.push(ValidationError::new("title", "cannot be empty"));
    } else if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push(ValidationError::new(
            "title",
            format!("cannot exceed {MAX_TITLE_LENGTH} characters"),
        ));
    }

    if request
        .estimated_size
        .is_some_and(|size| !size.is_finite() || size < 0.0)
    {
        errors.push(ValidationError::new("estimatedSize", "must be a non-negative number"));
    }

    let tags = match normalize_tags(&request.tags) {
        Ok(tags) => tags,
        Err(tag_errors) => {
            errors.extend(tag_errors);
            Vec::new()
        }
    };

    let custom_fields = match validate_custom_fields(session, item.item_type(), &request.custom_fields) {
        Ok(values) => values,
        Err(YabtError::ValidationErrors { errors: field_errors }) => {
            errors.extend(field_errors);
            BTreeMap::new()
        }
        Err(YabtError::Validation { field, reason }) => {
            errors.push(ValidationError::new(field, reason));
            BTreeMap::new()
        }
        Err(other) => return Err(other),
    };

    let mut related_items: Vec<BacklogItemRelation> =
        Vec::with_capacity(request.related_items.len());
    for (related_id, link_type) in &request.related_items {
        if !item.id.is_empty() && normalize_id(related_id) == normalize_id(&item.id) {
            errors.push(ValidationError::new("relatedItems", "an item cannot relate to itself"));
            continue;
        }
        let target = load_item(session, related_id)?;
        let target_id = short_id(&target.id).to_string();
        if related_items
            .iter()
            .any(|r| normalize_id(&r.related_to.id) == normalize_id(&target_id))
        {
            errors.push(ValidationError::new(
                "relatedItems",
                format!("{target_id} is linked more than once"),
            ));
            continue;
        }
        related_items.push(BacklogItemRelation {
            related_to: BacklogItemReference {
                id: target_id,
                name: target.title.clone(),
            },
            link_type: *link_type,
        });
    }

    if !errors.is_empty() {
        return Err(YabtError::from_validation_errors(errors));
    }

    item.title = title.to_string();
    item.estimated_size = request.estimated_size;
    item.assignee = resolve_assignee(session, request.assignee_id.as_deref())?;
    item.tags = tags;
    item.custom_fields = custom_fields;
    item.related_items = related_items;
    Ok(())
}

/// Trim, drop blanks and de-duplicate case-insensitively (first spelling wins).
fn normalize_tags(raw: &[String]) -> std::result::Result<Vec<String>, Vec<ValidationError>> {
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();

    for tag in raw.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LENGTH {
            errors.push(ValidationError::new(
                "tags",
                format!("'{tag}' exceeds {MAX_TAG_LENGTH} characters"),
            ));
        } else if !tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
            tags.push(tag.to_string());
        }
    }

    if errors.is_empty() { Ok(tags) } else { Err(errors) }
}

/// Check values against field definitions; keys become short field ids.
fn validate_custom_fields(
    reader: &impl DocumentRead,
    item_type: BacklogItemType,
    values: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, Value>> {
    let fields = reader.query_all::<CustomField>()?;
    let mut errors = Vec::new();
    let mut out = BTreeMap::new();

    for (key, value) in values {
        if value.is_null() {
            continue;
        }
        let field = fields
            .iter()
            .find(|f| normalize_id(&f.id) == normalize_id(key))
            .ok_or_else(|| YabtError::CustomFieldNotFound { id: key.clone() })?;
        let field_key = format!("customFields.{}", short_id(&field.id));

        if !field.applies_to(item_type) {
            errors.push(ValidationError::new(
                field_key,
                format!("'{}' does not apply to {item_type} items", field.name),
            ));
        } else if let Err(reason) = field.field_type.check_value(value) {
            errors.push(ValidationError::new(field_key, format!("'{}': {reason}", field.name)));
        } else {
            out.insert(short_id(&field.id).to_string(), value.clone());
        }
    }

    for field in fields.iter().filter(|f| f.is_mandatory && f.applies_to(item_type)) {
        let short = short_id(&field.id);
        if !out.contains_key(short) && !errors.iter().any(|e| e.field.ends_with(short)) {
            errors.push(ValidationError::new(
                format!("customFields.{short}"),
                format!("'{}' is mandatory", field.name),
            ));
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(YabtError::from_validation_errors(errors))
    }
}

/// Mirror the item's relations onto the items it links to.
///
/// Dropped links are removed from the other side; new or changed links are
/// written there with the inverse type.
fn sync_relations(
    session: &mut Session<'_>,
    actor: &UserReference,
    item: &BacklogItem,
    previous: &[BacklogItemRelation],
) -> Result<()> {
    let self_id = short_id(&item.id).to_string();

    for old in previous {
        if item.relation_to(&old.related_to.id).is_some() {
            continue;
        }
        let Some(mut target) = session.load::<BacklogItem>(&old.related_to.id)? else {
            continue;
        };
        if target.remove_relations_to(&self_id) {
            target.add_history_record(actor, format!("Removed link to {self_id}"));
            session.store(&mut target)?;
        }
    }

    for relation in &item.related_items {
        let mut target = load_item(session, &relation.related_to.id)?;
        let mirrored = BacklogItemRelation {
            related_to: BacklogItemReference {
                id: self_id.clone(),
                name: item.title.clone(),
            },
            link_type: relation.link_type.inverse(),
        };
        if target.relation_to(&self_id) == Some(&mirrored) {
            continue;
        }
        target.remove_relations_to(&self_id);
        target.related_items.push(mirrored);
        target.add_history_record(
            actor,
            format!("Linked to {self_id} ({})", relation.link_type.inverse().as_str()),
        );
        session.store(&mut target)?;
    }
    Ok(())
}
