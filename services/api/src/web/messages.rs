//! services/api/src/web/messages.rs
//!
//! The feedback board shared between the agency and the client team.

use crate::error::{error_response, port_error_response, HandlerError};
use crate::web::{notify::spawn_notification, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use call_desk_core::domain::{Message, SenderRole};
use call_desk_core::notification::Notification;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
    #[serde(default)]
    pub sender: Option<SenderRole>,
    #[serde(default)]
    pub author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub text: String,
}

fn message_text(text: &str) -> Result<String, HandlerError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Message text is required"));
    }
    Ok(text.to_string())
}

/// GET /api/messages - Oldest first
pub async fn list_messages_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Message>>, HandlerError> {
    app_state
        .db
        .list_messages()
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to load messages", e))
}

/// POST /api/messages
pub async fn post_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let message = Message {
        id: Uuid::new_v4(),
        sender: req.sender.unwrap_or(SenderRole::User),
        text: message_text(&req.text)?,
        author_name: req
            .author_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        created_at: Utc::now(),
    };

    let created = app_state
        .board
        .post_message(app_state.db.as_ref(), message)
        .await
        .map_err(|e| port_error_response("Failed to post message", e))?;
    // Only client feedback is mailed to staff; agency replies are not.
    if created.sender == SenderRole::User {
        spawn_notification(&app_state, Notification::feedback_created(&created));
    }

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/messages/{id}
pub async fn edit_message_handler(
    State(app_state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
    Json(req): Json<EditMessageRequest>,
) -> Result<Json<Message>, HandlerError> {
    let text = message_text(&req.text)?;
    app_state
        .board
        .edit_message(app_state.db.as_ref(), message_id, text)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to edit message", e))
}

/// DELETE /api/messages/{id}
pub async fn delete_message_handler(
    State(app_state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    app_state
        .board
        .delete_message(app_state.db.as_ref(), message_id)
        .await
        .map_err(|e| port_error_response("Failed to delete message", e))?;
    Ok(StatusCode::NO_CONTENT)
}
