//! Custom field endpoints

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
use crate::services::custom_fields::{
    self, CustomFieldAddRequest, CustomFieldListGetRequest, CustomFieldListGetResponse,
    CustomFieldUpdRequest,
};

/// GET /api/CustomFields - ordered by name
async fn list_fields(
    State(state): State<Arc<AppState>>,
    Query(request): Query<CustomFieldListGetRequest>,
) -> Result<Json<Vec<CustomFieldListGetResponse>>, ApiError> {
    let fields = state
        .run(move |store| custom_fields::list(&*store, &request))
        .await?;
    Ok(Json(fields))
}

/// POST /api/CustomFields
async fn create_field(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CustomFieldAddRequest>,
) -> Result<(StatusCode, Json<CustomFieldListGetResponse>), ApiError> {
    let field = state
        .run(move |store| custom_fields::create(store, &request))
        .await?;
    Ok((StatusCode::CREATED, Json(field)))
}

/// GET /api/CustomFields/{id}
async fn get_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CustomFieldListGetResponse>, ApiError> {
    let field = state
        .run(move |store| custom_fields::get(&*store, &id))
        .await?;
    Ok(Json(field))
}

/// PUT /api/CustomFields/{id}
async fn update_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<CustomFieldUpdRequest>,
) -> Result<Json<CustomFieldListGetResponse>, ApiError> {
    let field = state
        .run(move |store| custom_fields::update(store, &id, &request))
        .await?;
    Ok(Json(field))
}

/// DELETE /api/CustomFields/{id} - also strips the field's values from items
async fn delete_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = state
        .run(move |store| custom_fields::delete(store, &id))
        .await?;
    Ok(Json(DeletedResponse { id }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/CustomFields", get(list_fields).post(create_field))
        .route(
            "/api/CustomFields/{id}",
            get(get_field).put(update_field).delete(delete_field),
        )
}
