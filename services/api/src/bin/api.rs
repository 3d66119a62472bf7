//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, ResendAdapter, UltravoxAdapter},
    config::Config,
    error::ApiError,
    web::{self, board::BoardHub, rest::ApiDoc, state::AppState},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use call_desk_core::ports::{CallProvider, Mailer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Provider Adapters ---
    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let call_provider: Option<Arc<dyn CallProvider>> = match config.ultravox_api_key.clone() {
        Some(key) => {
            info!("Call provider key present.");
            Some(Arc::new(UltravoxAdapter::new(
                http_client.clone(),
                config.ultravox_base_url.clone(),
                key,
            )))
        }
        None => {
            warn!("No call provider key configured; call creation will fail.");
            None
        }
    };
    let mailer: Option<Arc<dyn Mailer>> = match config.resend_api_key.clone() {
        Some(key) => {
            info!("Email provider key present.");
            Some(Arc::new(ResendAdapter::new(
                http_client,
                config.resend_base_url.clone(),
                key,
            )))
        }
        None => {
            warn!("No email provider key configured; notifications will fail.");
            None
        }
    };

    // --- 4. Build the Shared AppState ---
    let board = Arc::new(BoardHub::new());
    board.resync(db_adapter.as_ref()).await?;
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        call_provider,
        mailer,
        board,
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let api_router = web::router(app_state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
