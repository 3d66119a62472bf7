//! services/api/src/web/calls.rs
//!
//! Read-only call history and the dashboard aggregates.

use crate::error::{port_error_response, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use call_desk_core::domain::Call;
use call_desk_core::stats::DashboardStats;
use call_desk_core::view::{query_calls, CallQuery, Page};
use chrono::Utc;
use std::sync::Arc;

/// GET /api/calls - Filtered, paginated call history, newest first
pub async fn list_calls_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<CallQuery>,
) -> Result<Json<Page<Call>>, HandlerError> {
    let calls = app_state
        .db
        .list_calls()
        .await
        .map_err(|e| port_error_response("Failed to load calls", e))?;
    Ok(Json(query_calls(&calls, &query)))
}

/// GET /api/calls/{id}
pub async fn get_call_handler(
    State(app_state): State<Arc<AppState>>,
    Path(call_id): Path<String>,
) -> Result<Json<Call>, HandlerError> {
    app_state
        .db
        .get_call(&call_id)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to load call", e))
}

/// GET /api/dashboard/stats - KPI cards, weekly chart and outcome breakdown
pub async fn dashboard_stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, HandlerError> {
    let calls = app_state
        .db
        .list_calls()
        .await
        .map_err(|e| port_error_response("Failed to load calls", e))?;
    Ok(Json(DashboardStats::compute(&calls, Utc::now())))
}
