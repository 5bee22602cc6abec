//! HTTP handler for the landing page figures

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::dashboard::{Dashboard, DashboardService};
use crate::AppState;

/// Inventory dashboard
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<Dashboard>> {
    let summary = DashboardService::new(state.store.clone()).summary().await?;
    Ok(Json(summary))
}
