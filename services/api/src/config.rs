//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use call_desk_core::domain::{Agent, AgentStatus};
use std::net::SocketAddr;
use tracing::Level;

const DEFAULT_ULTRAVOX_BASE_URL: &str = "https://api.ultravox.ai";
const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_MAIL_FROM: &str = "IA Prejudicial <info@panel.ia-al-telefono.com>";
const DEFAULT_RECIPIENTS: &str = "info@telvia.io,arodriguez@mc2legal.es";
const DEFAULT_APP_URL: &str = "https://mc2-legal-dashboard.vercel.app/";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Absent keys do not stop startup; the relay that needs them answers 500 instead.
    pub ultravox_api_key: Option<String>,
    pub ultravox_base_url: String,
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
    pub mail_from: String,
    pub notify_recipients: Vec<String>,
    pub app_url: String,
    pub dashboard_username: String,
    pub dashboard_password_hash: String,
    pub session_ttl_days: i64,
    pub cors_origin: String,
    pub notify_on_changes: bool,
    pub agents: Vec<Agent>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| var(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()));

        // --- Load Server and Database Settings ---
        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Provider Keys (as optional, with the legacy prefixed names) ---
        let ultravox_api_key = var("ULTRAVOX_API_KEY").or_else(|| var("VITE_ULTRAVOX_API_KEY"));
        let resend_api_key = var("RESEND_API_KEY").or_else(|| var("VITE_RESEND_API_KEY"));

        let ultravox_base_url = var("ULTRAVOX_BASE_URL")
            .unwrap_or_else(|| DEFAULT_ULTRAVOX_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let resend_base_url = var("RESEND_BASE_URL")
            .unwrap_or_else(|| DEFAULT_RESEND_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        // --- Load Notification Settings ---
        let mail_from = var("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());
        let notify_recipients = parse_recipients(
            &var("NOTIFY_RECIPIENTS").unwrap_or_else(|| DEFAULT_RECIPIENTS.to_string()),
        )?;
        let app_url = var("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string());
        let notify_on_changes = match var("NOTIFY_ON_CHANGES") {
            Some(raw) => parse_bool("NOTIFY_ON_CHANGES", &raw)?,
            None => false,
        };

        // --- Load Login Settings ---
        let dashboard_username = required("DASHBOARD_USERNAME")?;
        let dashboard_password_hash = required("DASHBOARD_PASSWORD_HASH")?;
        let session_ttl_days = match var("SESSION_TTL_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_TTL_DAYS".to_string(),
                        format!("'{}' is not a positive number of days", raw),
                    )
                })?,
            None => 30,
        };
        let cors_origin =
            var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        let agents = match var("AGENTS_JSON") {
            Some(raw) => serde_json::from_str::<Vec<Agent>>(&raw).map_err(|e| {
                ConfigError::InvalidValue("AGENTS_JSON".to_string(), e.to_string())
            })?,
            None => default_agents(),
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            ultravox_api_key,
            ultravox_base_url,
            resend_api_key,
            resend_base_url,
            mail_from,
            notify_recipients,
            app_url,
            dashboard_username,
            dashboard_password_hash,
            session_ttl_days,
            cors_origin,
            notify_on_changes,
            agents,
        })
    }
}

fn parse_recipients(raw: &str) -> Result<Vec<String>, ConfigError> {
    let recipients: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if recipients.is_empty() || recipients.iter().any(|r| !r.contains('@')) {
        return Err(ConfigError::InvalidValue(
            "NOTIFY_RECIPIENTS".to_string(),
            format!("'{}' is not a comma separated list of addresses", raw),
        ));
    }
    Ok(recipients)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", raw),
        )),
    }
}

/// The catalog served when `AGENTS_JSON` is not set.
fn default_agents() -> Vec<Agent> {
    vec![Agent {
        id: "36b1efef-2ffa-4a92-9c02-af3d2d0689d3".to_string(),
        name: "Agente de Cobranza".to_string(),
        description: "Agente especializado en gestión de deudas y cobros".to_string(),
        status: AgentStatus::Active,
    }]
}
