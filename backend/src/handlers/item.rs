//! HTTP handlers for item endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Item, ItemFilter};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::item::{ArchiveInput, ItemDetail, ItemInput, ItemService, ItemSummary};
use crate::AppState;

/// Query parameters for listing items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    /// `All`, `Archived` or a category name
    pub filter: Option<String>,
}

fn service(state: &AppState) -> ItemService {
    ItemService::new(state.store.clone(), state.admin.clone())
}

/// List items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<ItemSummary>>> {
    let filter = ItemFilter::parse(query.filter.as_deref());
    let items = service(&state).list(&filter).await?;
    Ok(Json(items))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<ItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Get item details
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ItemDetail>> {
    let detail = service(&state).detail(id).await?;
    Ok(Json(detail))
}

/// Update an item
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ItemInput>,
) -> AppResult<Json<Item>> {
    let item = service(&state).update(id, input).await?;
    Ok(Json(item))
}

/// Archive or restore an item (admin password required)
pub async fn archive_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ArchiveInput>,
) -> AppResult<Json<Item>> {
    let item = service(&state).archive(id, &input).await?;
    Ok(Json(item))
}
