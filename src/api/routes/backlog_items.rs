//! Backlog item endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use super::DeletedResponse;
use crate::api::error::ApiError;
use crate::api::extractors::CurrentUserId;
use crate::api::server::AppState;
use crate::model::{BacklogItemState, BacklogItemType, Comment};
use crate::services::ListResponse;
use crate::services::backlog_items::comments::{self, CommentAddUpdRequest};
use crate::services::backlog_items::{
    BacklogItemAddUpdRequest, BacklogItemGetResponse, BacklogItemListGetRequest,
    BacklogItemListGetResponse, BacklogItemTagListGetRequest, commands, queries,
};
use crate::storage::TagCount;
use crate::util::id::parse_sequence;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRequest {
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/BacklogItems - filtered, ordered, paged list
async fn list_items(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Query(request): Query<BacklogItemListGetRequest>,
) -> Result<Json<ListResponse<BacklogItemListGetResponse>>, ApiError> {
    let limits = state.limits;
    let page = state
        .run(move |store| queries::list(&*store, &request, user.as_deref(), &limits))
        .await?;
    Ok(Json(page))
}

/// GET /api/BacklogItems/tags - tags with item counts
async fn list_tags(
    State(state): State<Arc<AppState>>,
    Query(request): Query<BacklogItemTagListGetRequest>,
) -> Result<Json<Vec<TagCount>>, ApiError> {
    let max_tags = state.max_tags;
    let tags = state
        .run(move |store| queries::tags(&*store, &request, max_tags))
        .await?;
    Ok(Json(tags))
}

/// GET /api/BacklogItems/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BacklogItemGetResponse>, ApiError> {
    let item = state.run(move |store| queries::get(&*store, &id)).await?;
    Ok(Json(item))
}

/// POST /api/BacklogItems/{type} - create an item of the given type
async fn create_item(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path(item_type): Path<String>,
    Json(request): Json<BacklogItemAddUpdRequest>,
) -> Result<(StatusCode, Json<BacklogItemGetResponse>), ApiError> {
    if parse_sequence(&item_type).is_some() {
        return Err(ApiError::bad_request(format!(
            "'{item_type}' is an item id; create with POST /api/BacklogItems/{{type}} \
             (bug, userStory, task, feature) or update with PUT"
        )));
    }
    let item_type: BacklogItemType = item_type.parse()?;
    let item = state
        .run(move |store| commands::create(store, user.as_deref(), item_type, &request))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/BacklogItems/{id}
async fn update_item(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path(id): Path<String>,
    Json(request): Json<BacklogItemAddUpdRequest>,
) -> Result<Json<BacklogItemGetResponse>, ApiError> {
    let item = state
        .run(move |store| commands::update(store, user.as_deref(), &id, &request))
        .await?;
    Ok(Json(item))
}

/// DELETE /api/BacklogItems/{id}
async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = state.run(move |store| commands::delete(store, &id)).await?;
    Ok(Json(DeletedResponse { id }))
}

/// PUT /api/BacklogItems/{id}/state
async fn set_state(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path(id): Path<String>,
    Json(request): Json<StateRequest>,
) -> Result<Json<BacklogItemGetResponse>, ApiError> {
    let new_state: BacklogItemState = request.state.parse()?;
    let item = state
        .run(move |store| commands::set_state(store, user.as_deref(), &id, new_state))
        .await?;
    Ok(Json(item))
}

/// PUT /api/BacklogItems/{id}/assignee - `userId: null` unassigns
async fn assign(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path(id): Path<String>,
    Json(request): Json<AssigneeRequest>,
) -> Result<Json<BacklogItemGetResponse>, ApiError> {
    let item = state
        .run(move |store| {
            commands::assign(store, user.as_deref(), &id, request.user_id.as_deref())
        })
        .await?;
    Ok(Json(item))
}

/// GET /api/BacklogItems/{id}/comments - newest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let list = state.run(move |store| comments::list(&*store, &id)).await?;
    Ok(Json(list))
}

/// POST /api/BacklogItems/{id}/comments
async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path(id): Path<String>,
    Json(request): Json<CommentAddUpdRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .run(move |store| comments::add(store, user.as_deref(), &id, &request))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/BacklogItems/{id}/comments/{cid}
async fn update_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path((id, comment_id)): Path<(String, String)>,
    Json(request): Json<CommentAddUpdRequest>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state
        .run(move |store| comments::update(store, user.as_deref(), &id, &comment_id, &request))
        .await?;
    Ok(Json(comment))
}

/// DELETE /api/BacklogItems/{id}/comments/{cid}
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUserId,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .run(move |store| comments::delete(store, user.as_deref(), &id, &comment_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Backlog item routes.
///
/// The `{id}` segment shares one route for every method, so for `POST` it
/// carries the item type (`/api/BacklogItems/bug`). An id there is rejected.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/BacklogItems", get(list_items))
        .route("/api/BacklogItems/tags", get(list_tags))
        .route(
            "/api/BacklogItems/{id}",
            get(get_item)
                .post(create_item)
                .put(update_item)
                .delete(delete_item),
        )
        .route("/api/BacklogItems/{id}/state", put(set_state))
        .route("/api/BacklogItems/{id}/assignee", put(assign))
        .route(
            "/api/BacklogItems/{id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/api/BacklogItems/{id}/comments/{cid}",
            put(update_comment).delete(delete_comment),
        )
}
