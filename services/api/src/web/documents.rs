//! services/api/src/web/documents.rs

use crate::error::{error_response, port_error_response, HandlerError};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use call_desk_core::domain::Document;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub url: String,
}

/// GET /api/documents - Newest first
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<Document>>, HandlerError> {
    app_state
        .db
        .list_documents()
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to load documents", e))
}

/// POST /api/documents - Register a link to an external document
pub async fn create_document_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let name = req.name.trim();
    let url = req.url.trim();
    if name.is_empty() || url.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Document name and url are required",
        ));
    }
    let parsed = reqwest::Url::parse(url)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Document url is not valid"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Document url must use http or https",
        ));
    }

    let document = Document {
        id: Uuid::new_v4(),
        name: name.to_string(),
        url: url.to_string(),
        created_at: Utc::now(),
    };
    let created = app_state
        .db
        .create_document(&document)
        .await
        .map_err(|e| port_error_response("Failed to create document", e))?;
    info!("Document '{}' added", created.name);

    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/documents/{id}
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    app_state
        .db
        .delete_document(document_id)
        .await
        .map_err(|e| port_error_response("Failed to delete document", e))?;
    Ok(StatusCode::NO_CONTENT)
}
