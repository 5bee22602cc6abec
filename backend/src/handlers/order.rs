//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{ItemQuantities, Order, OrderFilter};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::order::{OrderDetail, OrderInput, OrderService, OrderSummary};
use crate::services::DeleteInput;
use crate::AppState;

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub filter: OrderFilter,
}

fn service(state: &AppState) -> OrderService {
    OrderService::new(state.store.clone(), state.admin.clone())
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let orders = service(&state).list(query.filter).await?;
    Ok(Json(orders))
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<OrderInput>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get order details
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let detail = service(&state).detail(id).await?;
    Ok(Json(detail))
}

/// Update a saved order
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<OrderInput>,
) -> AppResult<Json<Order>> {
    let order = service(&state).update(id, input).await?;
    Ok(Json(order))
}

/// Place a saved order
pub async fn place_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = service(&state).place(id).await?;
    Ok(Json(order))
}

/// Delete an order (admin password required)
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DeleteInput>,
) -> AppResult<StatusCode> {
    service(&state).delete(id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Quantity on order per item
pub async fn quantity_on_order(State(state): State<AppState>) -> AppResult<Json<ItemQuantities>> {
    let on_order = service(&state).quantity_on_order().await?;
    Ok(Json(on_order))
}
