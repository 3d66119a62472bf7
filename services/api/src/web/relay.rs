//! services/api/src/web/relay.rs
//!
//! The two relay endpoints: call creation at the call provider and staff
//! notifications through the email provider. Both attach a server-held key the
//! browser never sees.

use crate::error::ErrorBody;
use crate::web::{notify::compose_email, state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use call_desk_core::notification::Notification;
use call_desk_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

pub const MISSING_KEY_MESSAGE: &str = "Server configuration error: API key not found";

//=========================================================================================
// Payloads
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    /// A string or a number; numbers are sent in their decimal form.
    #[schema(value_type = Option<String>)]
    pub agent_id: Option<serde_json::Value>,
}

impl CreateCallRequest {
    /// The agent to call, if one was given. Blank strings and zero count as missing.
    pub fn agent_id(&self) -> Option<String> {
        match self.agent_id.as_ref()? {
            serde_json::Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
            serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SendNotificationRequest {
    /// One of `task_created`, `task_completed`, `feedback_created`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub success: bool,
    pub email_id: Option<String>,
}

fn json_error(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            message: None,
        }),
    )
        .into_response()
}

/// Fallback for any method other than POST on the relay routes.
pub async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a call for an agent at the call provider and return its join handle.
///
/// The provider's body is returned unchanged on success; on a provider error its
/// status is kept and its body is wrapped under `details`.
#[utoipa::path(
    post,
    path = "/api/create-call",
    request_body = CreateCallRequest,
    responses(
        (status = 200, description = "The provider's call object, including joinUrl and callId"),
        (status = 400, description = "agentId is missing", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 500, description = "Missing API key or unexpected failure", body = ErrorBody)
    )
)]
pub async fn create_call_handler(State(app_state): State<Arc<AppState>>, body: Bytes) -> Response {
    let Some(provider) = app_state.call_provider.as_ref() else {
        error!("ULTRAVOX_API_KEY or VITE_ULTRAVOX_API_KEY is not set");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_MESSAGE);
    };

    let agent_id = serde_json::from_slice::<CreateCallRequest>(&body)
        .ok()
        .and_then(|req| req.agent_id());
    let Some(agent_id) = agent_id else {
        return json_error(StatusCode::BAD_REQUEST, "agentId is required");
    };

    match provider.create_call(&agent_id).await {
        Ok(call) => (StatusCode::OK, Json(call)).into_response(),
        Err(PortError::Upstream { status, body }) => {
            // Prefer structured details when the provider sent JSON.
            let details = serde_json::from_str::<serde_json::Value>(&body)
                .unwrap_or(serde_json::Value::String(body));
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                code,
                Json(json!({
                    "error": "Failed to create call",
                    "details": details,
                    "status": status,
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!("Error creating call: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Internal server error".to_string(),
                    message: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Render a staff notification and send it to the fixed recipient list.
#[utoipa::path(
    post,
    path = "/api/send-notification",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Email accepted by the provider", body = SendNotificationResponse),
        (status = 400, description = "Missing or unknown notification type", body = ErrorBody),
        (status = 405, description = "Method not allowed", body = ErrorBody),
        (status = 500, description = "Missing API key or provider failure", body = ErrorBody)
    )
)]
pub async fn send_notification_handler(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let Some(mailer) = app_state.mailer.as_ref() else {
        error!("RESEND_API_KEY is not set");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_MESSAGE);
    };

    let (kind, data) = match serde_json::from_slice::<SendNotificationRequest>(&body) {
        Ok(req) => (req.kind, req.data),
        Err(_) => (None, None),
    };
    let notification = match Notification::parse(kind.as_deref(), data) {
        Ok(notification) => notification,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let email = compose_email(&app_state.config, &notification);
    match mailer.send_email(&email).await {
        Ok(email_id) => {
            info!(
                "Notification '{}' sent: {:?}",
                notification.kind().as_str(),
                email_id
            );
            (
                StatusCode::OK,
                Json(SendNotificationResponse {
                    success: true,
                    email_id,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Error sending email: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to send notification".to_string(),
                    message: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
