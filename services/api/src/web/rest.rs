//! services/api/src/web/rest.rs
//!
//! Small REST handlers and the master definition for the OpenAPI specification.

use crate::error::ErrorBody;
use crate::web::{auth, relay, state::AppState};
use axum::{extract::State, response::Json};
use call_desk_core::domain::Agent;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::login_handler,
        auth::logout_handler,
        relay::create_call_handler,
        relay::send_notification_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            auth::LoginRequest,
            auth::LoginResponse,
            relay::CreateCallRequest,
            relay::SendNotificationRequest,
            relay::SendNotificationResponse,
        )
    ),
    tags(
        (name = "Call Desk API", description = "Relays and data endpoints for the collections dashboard.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Handlers
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/agents - The configured agent catalog for the playground
pub async fn list_agents_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<Agent>> {
    Json(app_state.config.agents.clone())
}
