//! services/api/src/web/auth.rs
//!
//! Login and logout for the dashboard's single operator account.

use crate::error::{error_response, port_error_response, ErrorBody, HandlerError};
use crate::web::{middleware::session_token, state::AppState};
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Credenciales incorrectas";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    /// Also set as the `session` cookie; clients without cookies send it as a bearer token.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/login - Exchange the operator credentials for a session
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    // 1. Check the username and the password against the configured hash
    if req.username != state.config.dashboard_username {
        warn!("Login rejected for unknown user '{}'", req.username);
        return Err(error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    let parsed_hash = PasswordHash::new(&state.config.dashboard_password_hash).map_err(|e| {
        error!("Failed to parse the configured password hash: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error")
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();
    if !valid {
        warn!("Login rejected for '{}': wrong password", req.username);
        return Err(error_response(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    // 2. Issue and store the session token
    let token = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now() + ttl;
    state
        .db
        .create_auth_session(&token, expires_at)
        .await
        .map_err(|e| port_error_response("Failed to create session", e))?;

    // 3. Hand it back as a cookie and in the body
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        ttl.num_seconds()
    );
    info!("Operator '{}' logged in", req.username);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            username: req.username,
            token,
            expires_at,
        }),
    ))
}

/// POST /api/auth/logout - Invalidate the current session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let token = session_token(&headers)
        .ok_or_else(|| error_response(StatusCode::UNAUTHORIZED, "No session found"))?;

    state
        .db
        .delete_auth_session(&token)
        .await
        .map_err(|e| port_error_response("Failed to logout", e))?;

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}
