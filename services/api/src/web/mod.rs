pub mod auth;
pub mod board;
pub mod calls;
pub mod documents;
pub mod messages;
pub mod middleware;
pub mod notify;
pub mod protocol;
pub mod relay;
pub mod rest;
pub mod state;
pub mod tasks;
pub mod voice;
pub mod ws_handler;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds every API and WebSocket route. Only `/health` and login are public.
pub fn router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api/auth/login", post(auth::login_handler));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout_handler))
        // Relays
        .route(
            "/api/create-call",
            post(relay::create_call_handler).fallback(relay::method_not_allowed),
        )
        .route(
            "/api/send-notification",
            post(relay::send_notification_handler).fallback(relay::method_not_allowed),
        )
        // Dashboard
        .route("/api/calls", get(calls::list_calls_handler))
        .route("/api/calls/{id}", get(calls::get_call_handler))
        .route("/api/dashboard/stats", get(calls::dashboard_stats_handler))
        .route("/api/agents", get(rest::list_agents_handler))
        // Task board
        .route(
            "/api/tasks",
            get(tasks::list_tasks_handler).post(tasks::create_task_handler),
        )
        .route("/api/tasks/board", get(tasks::task_board_handler))
        .route(
            "/api/tasks/{id}",
            patch(tasks::update_task_handler).delete(tasks::delete_task_handler),
        )
        .route("/api/tasks/{id}/complete", post(tasks::complete_task_handler))
        .route("/api/tasks/{id}/restore", post(tasks::restore_task_handler))
        // Message board
        .route(
            "/api/messages",
            get(messages::list_messages_handler).post(messages::post_message_handler),
        )
        .route(
            "/api/messages/{id}",
            patch(messages::edit_message_handler).delete(messages::delete_message_handler),
        )
        // Documents
        .route(
            "/api/documents",
            get(documents::list_documents_handler).post(documents::create_document_handler),
        )
        .route("/api/documents/{id}", delete(documents::delete_document_handler))
        // Push and voice
        .route("/ws/board", get(ws_handler::board_ws_handler))
        .route("/ws/voice", get(voice::voice_ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
