//! services/api/src/web/tasks.rs
//!
//! The shared task board. Writes go through the board hub so subscribers see
//! them before the store confirms.

use crate::error::{error_response, port_error_response, HandlerError};
use crate::web::{notify::spawn_notification, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use call_desk_core::domain::{Task, TaskCategory, TaskFilter, TaskPatch};
use call_desk_core::notification::Notification;
use call_desk_core::view::TaskBoard;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    #[serde(default)]
    pub state: TaskFilter,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub text: String,
    #[serde(default)]
    pub category: Option<TaskCategory>,
}

/// Trims `text` and rejects it when nothing is left.
fn task_text(text: &str) -> Result<String, HandlerError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Task text is required"));
    }
    Ok(text.to_string())
}

/// GET /api/tasks?state=pending|completed|all
pub async fn list_tasks_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, HandlerError> {
    app_state
        .db
        .list_tasks(query.state)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to load tasks", e))
}

/// GET /api/tasks/board?state=... - Tasks grouped into the two category columns
pub async fn task_board_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<TaskBoard>, HandlerError> {
    let tasks = app_state
        .db
        .list_tasks(TaskFilter::All)
        .await
        .map_err(|e| port_error_response("Failed to load tasks", e))?;
    Ok(Json(TaskBoard::build(&tasks, query.state)))
}

/// POST /api/tasks
pub async fn create_task_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let task = Task {
        id: Uuid::new_v4(),
        text: task_text(&req.text)?,
        category: req.category.unwrap_or(TaskCategory::Mc2),
        created_at: Utc::now(),
        completed_at: None,
    };

    let created = app_state
        .board
        .create_task(app_state.db.as_ref(), task)
        .await
        .map_err(|e| port_error_response("Failed to create task", e))?;
    info!("Task {} created in {}", created.id, created.category);
    spawn_notification(&app_state, Notification::task_created(&created));

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/tasks/{id} - Edit text and/or category
pub async fn update_task_handler(
    State(app_state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
    Json(mut patch): Json<TaskPatch>,
) -> Result<Json<Task>, HandlerError> {
    if let Some(text) = patch.text.as_deref() {
        patch.text = Some(task_text(text)?);
    }
    app_state
        .board
        .update_task(app_state.db.as_ref(), task_id, patch)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to update task", e))
}

/// POST /api/tasks/{id}/complete
pub async fn complete_task_handler(
    State(app_state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, HandlerError> {
    let task = app_state
        .board
        .set_task_completed_at(app_state.db.as_ref(), task_id, Some(Utc::now()))
        .await
        .map_err(|e| port_error_response("Failed to complete task", e))?;
    spawn_notification(&app_state, Notification::task_completed(&task));
    Ok(Json(task))
}

/// POST /api/tasks/{id}/restore - Put a completed task back on the pending list
pub async fn restore_task_handler(
    State(app_state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, HandlerError> {
    app_state
        .board
        .set_task_completed_at(app_state.db.as_ref(), task_id, None)
        .await
        .map(Json)
        .map_err(|e| port_error_response("Failed to restore task", e))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task_handler(
    State(app_state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, HandlerError> {
    app_state
        .board
        .delete_task(app_state.db.as_ref(), task_id)
        .await
        .map_err(|e| port_error_response("Failed to delete task", e))?;
    Ok(StatusCode::NO_CONTENT)
}
