//! Category routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extractors::CoupleMember};
use tandem_core::expense::{CategoryUpdate, NewCategory};
use tandem_db::CategoryRepository;
use tandem_shared::types::CategoryId;

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{category_id}",
            patch(update_category).delete(delete_category),
        )
}

/// GET /categories - The couple's categories by name.
async fn list_categories(
    State(state): State<AppState>,
    member: CoupleMember,
) -> Result<impl IntoResponse, ApiError> {
    let categories = CategoryRepository::new(Arc::clone(&state.db))
        .list(member.couple.id)
        .await?;

    Ok(Json(json!({ "categories": categories })))
}

/// POST /categories - Create a category.
async fn create_category(
    State(state): State<AppState>,
    member: CoupleMember,
    Json(payload): Json<NewCategory>,
) -> Result<impl IntoResponse, ApiError> {
    let category = CategoryRepository::new(Arc::clone(&state.db))
        .create(member.couple.id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH `/categories/{category_id}` - Rename or recolor a category.
async fn update_category(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let category = CategoryRepository::new(Arc::clone(&state.db))
        .update(member.couple.id, CategoryId::from_uuid(category_id), payload)
        .await?;

    Ok(Json(category))
}

/// DELETE `/categories/{category_id}` - Delete a category; its expenses lose it.
async fn delete_category(
    State(state): State<AppState>,
    member: CoupleMember,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    CategoryRepository::new(Arc::clone(&state.db))
        .delete(member.couple.id, CategoryId::from_uuid(category_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
