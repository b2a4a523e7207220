//! Backlog item queries.

use super::{
    BacklogItemGetResponse, BacklogItemListGetRequest, BacklogItemListGetResponse,
    BacklogItemTagListGetRequest, CustomFieldValue, load_item,
};
use crate::error::{Result, YabtError};
use crate::model::{BacklogItem, CustomField};
use crate::services::{ListResponse, PagingLimits};
use crate::storage::{DocumentRead, ListFilter, TagCount, indexes};
use crate::util::id::{normalize_id, short_id};
use tracing::debug;

/// The full view of one item.
///
/// # Errors
///
/// Returns `BacklogItemNotFound` when there is no such item.
pub fn get(reader: &impl DocumentRead, item_id: &str) -> Result<BacklogItemGetResponse> {
    let item = load_item(reader, item_id)?;
    view(reader, &item)
}

/// Build the full view of a loaded item.
///
/// Values of custom fields that no longer exist are left out.
///
/// # Errors
///
/// Returns an error if the field definitions cannot be read.
pub fn view(reader: &impl DocumentRead, item: &BacklogItem) -> Result<BacklogItemGetResponse> {
    let fields = if item.custom_fields.is_empty() {
        Vec::new()
    } else {
        reader.query_all::<CustomField>()?
    };
    let custom_fields = item
        .custom_fields
        .iter()
        .filter_map(|(id, value)| {
            fields
                .iter()
                .find(|f| normalize_id(&f.id) == normalize_id(id))
                .map(|f| CustomFieldValue {
                    id: short_id(&f.id).to_string(),
                    name: f.name.clone(),
                    field_type: f.field_type,
                    value: value.clone(),
                })
        })
        .collect();

    let mut comments = item.comments.clone();
    comments.sort_by(|a, b| b.created.cmp(&a.created));

    Ok(BacklogItemGetResponse {
        id: short_id(&item.id).to_string(),
        title: item.title.clone(),
        state: item.state,
        estimated_size: item.estimated_size,
        assignee: item.assignee.clone(),
        tags: item.tags.clone(),
        related_items: item.related_items.clone(),
        custom_fields,
        comments,
        created: item.created().map(|r| r.change.clone()),
        last_updated: item.last_updated().map(|r| r.change.clone()),
        history: item.modified_by.clone(),
        details: item.details.clone(),
    })
}

/// Filter, order and page items through the `BacklogItems/ForList` index.
///
/// `current_user_id` is required only when the request filters by the
/// current user's relation to the items.
///
/// # Errors
///
/// Returns `InvalidState` for a bad state filter, `CurrentUserRequired`
/// for a relation filter without a user, or a storage error.
pub fn list(
    reader: &impl DocumentRead,
    request: &BacklogItemListGetRequest,
    current_user_id: Option<&str>,
    limits: &PagingLimits,
) -> Result<ListResponse<BacklogItemListGetResponse>> {
    let (page_index, page_size) = limits.resolve(request.page_index, request.page_size);

    let user_relation = match request.user_relation {
        Some(relation) => {
            let user_id = current_user_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or(YabtError::CurrentUserRequired)?;
            Some((relation, user_id.to_string()))
        }
        None => None,
    };

    let filter = ListFilter {
        search: request.search.clone(),
        item_types: request.item_type.into_iter().collect(),
        states: request.parsed_states()?,
        tags: request.parsed_tags(),
        assigned_user_id: request
            .assigned_user_id
            .clone()
            .filter(|id| !id.trim().is_empty()),
        user_relation,
        order_by: request.order_by.unwrap_or_default(),
        direction: request.order_direction.unwrap_or_default(),
        offset: page_index.saturating_mul(page_size),
        limit: page_size,
    };

    let page = indexes::list(reader.conn(), &filter)?;
    debug!(total = page.total, returned = page.ids.len(), "Listed backlog items");

    let mut entries = Vec::with_capacity(page.ids.len());
    for id in &page.ids {
        if let Some(item) = reader.load::<BacklogItem>(id)? {
            entries.push(BacklogItemListGetResponse::from(&item));
        }
    }
    Ok(ListResponse::new(entries, page_index, page_size, page.total))
}

/// Tags in use with their item counts, most common first.
///
/// # Errors
///
/// Returns an error if the index cannot be read.
pub fn tags(
    reader: &impl DocumentRead,
    request: &BacklogItemTagListGetRequest,
    default_max_tags: usize,
) -> Result<Vec<TagCount>> {
    let limit = request.max_tags.filter(|n| *n > 0).unwrap_or(default_max_tags);
    indexes::tag_counts(reader.conn(), request.search.as_deref(), limit)
}
