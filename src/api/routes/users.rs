//! User endpoints
//!
//! Renaming a user rewrites the references embedded in backlog items;
//! deleting one clears them.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use super::DeletedResponse;
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::services::ListResponse;
use crate::services::users::{
    self, UserAddUpdRequest, UserGetByIdResponse, UserListGetRequest, UserListGetResponse,
};

/// GET /api/Users
async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(request): Query<UserListGetRequest>,
) -> Result<Json<ListResponse<UserListGetResponse>>, ApiError> {
    let limits = state.limits;
    let page = state
        .run(move |store| users::list(&*store, &request, &limits))
        .await?;
    Ok(Json(page))
}

/// POST /api/Users
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UserAddUpdRequest>,
) -> Result<(StatusCode, Json<UserGetByIdResponse>), ApiError> {
    let user = state.run(move |store| users::create(store, &request)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/Users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserGetByIdResponse>, ApiError> {
    let user = state.run(move |store| users::get(&*store, &id)).await?;
    Ok(Json(user))
}

/// PUT /api/Users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UserAddUpdRequest>,
) -> Result<Json<UserGetByIdResponse>, ApiError> {
    let user = state
        .run(move |store| users::update(store, &id, &request))
        .await?;
    Ok(Json(user))
}

/// DELETE /api/Users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = state.run(move |store| users::delete(store, &id)).await?;
    Ok(Json(DeletedResponse { id }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/Users", get(list_users).post(create_user))
        .route(
            "/api/Users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}
