//! HTTP handlers for inventory count endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shared::CountListFilter;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::count::{
    CountDetail, CountInput, CountOutcome, CountService, CountSheet, CountSummary,
};
use crate::services::DeleteInput;
use crate::AppState;

/// Query parameters for listing counts
#[derive(Debug, Deserialize)]
pub struct ListCountsQuery {
    #[serde(default)]
    pub filter: CountListFilter,
}

/// Query parameters for a count sheet
#[derive(Debug, Deserialize)]
pub struct CountSheetQuery {
    /// `Full`, `AdHoc` or a category name
    pub filter: Option<String>,
}

fn service(state: &AppState) -> CountService {
    CountService::new(state.store.clone(), state.admin.clone())
}

/// List counts
pub async fn list_counts(
    State(state): State<AppState>,
    Query(query): Query<ListCountsQuery>,
) -> AppResult<Json<Vec<CountSummary>>> {
    let counts = service(&state).list(query.filter).await?;
    Ok(Json(counts))
}

/// Sheet for a new count
pub async fn start_count(
    State(state): State<AppState>,
    Query(query): Query<CountSheetQuery>,
) -> AppResult<Json<CountSheet>> {
    let sheet = service(&state)
        .start_count(query.filter.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(sheet))
}

/// Sheet for continuing a draft count
pub async fn count_sheet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CountSheetQuery>,
) -> AppResult<Json<CountSheet>> {
    let sheet = service(&state)
        .sheet_for_update(id, query.filter.as_deref())
        .await?;
    Ok(Json(sheet))
}

/// Save or submit a new count
pub async fn create_count(
    State(state): State<AppState>,
    Json(input): Json<CountInput>,
) -> AppResult<Response> {
    let outcome = service(&state).submit(None, input).await?;
    Ok(outcome_response(outcome, StatusCode::CREATED))
}

/// Save or submit an existing draft count
pub async fn update_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CountInput>,
) -> AppResult<Response> {
    let outcome = service(&state).submit(Some(id), input).await?;
    Ok(outcome_response(outcome, StatusCode::OK))
}

fn outcome_response(outcome: CountOutcome, saved: StatusCode) -> Response {
    match outcome {
        CountOutcome::Saved(count) => (saved, Json(count)).into_response(),
        CountOutcome::Rejected(form) => (StatusCode::UNPROCESSABLE_ENTITY, Json(form)).into_response(),
    }
}

/// Get count details
pub async fn get_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CountDetail>> {
    let detail = service(&state).detail(id).await?;
    Ok(Json(detail))
}

/// Delete a count (admin password required)
pub async fn delete_count(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<DeleteInput>,
) -> AppResult<StatusCode> {
    service(&state).delete(id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}
