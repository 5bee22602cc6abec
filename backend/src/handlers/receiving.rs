//! HTTP handlers for receiving endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use shared::ReceiptFilter;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::receiving::{
    ReceiptDetail, ReceiptInput, ReceiptOutcome, ReceivingOverview, ReceivingService,
};
use crate::services::DeleteInput;
use crate::AppState;

/// Query parameters for the receiving overview
#[derive(Debug, Deserialize)]
pub struct ReceivingQuery {
    #[serde(default)]
    pub filter: ReceiptFilter,
}

fn service(state: &AppState) -> ReceivingService {
    ReceivingService::new(state.store.clone(), state.admin.clone())
}

fn receipt_location(id: Uuid) -> String {
    format!("/api/v1/receiving/{}", id)
}

/// Orders awaiting delivery and recorded receipts
pub async fn receiving_overview(
    State(state): State<AppState>,
    Query(query): Query<ReceivingQuery>,
) -> AppResult<Json<ReceivingOverview>> {
    let overview = service(&state).overview(query.filter).await?;
    Ok(Json(overview))
}

/// Record a delivery that is not tied to an order
pub async fn create_receipt(
    State(state): State<AppState>,
    Json(input): Json<ReceiptInput>,
) -> AppResult<Response> {
    let outcome = service(&state).create(None, input).await?;
    Ok(outcome_response(outcome))
}

/// Record a delivery against an order. If the order already has a receipt
/// the client is redirected to it.
pub async fn create_order_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ReceiptInput>,
) -> AppResult<Response> {
    let outcome = service(&state).create(Some(order_id), input).await?;
    Ok(outcome_response(outcome))
}

fn outcome_response(outcome: ReceiptOutcome) -> Response {
    match outcome {
        ReceiptOutcome::Saved(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        ReceiptOutcome::Existing(id) => Redirect::to(&receipt_location(id)).into_response(),
    }
}

/// Get receipt details
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReceiptDetail>> {
    let detail = service(&state).detail(id).await?;
    Ok(Json(detail))
}

/// Update a draft receipt. Submitted receipts are not changed and the client
/// is sent back to them.
pub async fn update_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReceiptInput>,
) -> AppResult<Response> {
    match service(&state).update(id, input).await {
        Ok(receipt) => Ok(Json(receipt).into_response()),
        Err(AppError::InvalidState(reason)) => {
            tracing::debug!(receipt_id = %id, "{}", reason);
            Ok(Redirect::to(&receipt_location(id)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Delete a receipt (admin password required)
pub async fn delete_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DeleteInput>,
) -> AppResult<StatusCode> {
    service(&state).delete(id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}
