//! HTTP handlers for category endpoints

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use shared::Category;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::category::{
    CategoryDetail, CategoryInput, CategoryService, CategorySummary, ImageInput,
};
use crate::services::DeleteInput;
use crate::AppState;

fn service(state: &AppState) -> CategoryService {
    CategoryService::new(state.store.clone(), state.admin.clone())
}

/// List categories with their item counts
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategorySummary>>> {
    let categories = service(&state).list().await?;
    Ok(Json(categories))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get a category with its items
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CategoryDetail>> {
    let detail = service(&state).detail(id).await?;
    Ok(Json(detail))
}

/// Update a category
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<Category>> {
    let category = service(&state).update(id, input).await?;
    Ok(Json(category))
}

/// Delete a category (admin password required)
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DeleteInput>,
) -> AppResult<StatusCode> {
    service(&state).delete(id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Serve the category picture
pub async fn get_category_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let image = service(&state).image(id).await?;
    Ok(([(header::CONTENT_TYPE, image.content_type)], image.data))
}

/// Upload the category picture
pub async fn set_category_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ImageInput>,
) -> AppResult<Json<Category>> {
    let category = service(&state).set_image(id, input).await?;
    Ok(Json(category))
}
