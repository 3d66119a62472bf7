//! services/api/src/adapters/ultravox.rs
//!
//! This module contains the adapter for the Ultravox call-creation API.
//! It implements the `CallProvider` port from the `core` crate.

use async_trait::async_trait;
use call_desk_core::ports::{CallProvider, PortError, PortResult};
use reqwest::{Client, Url};
use tracing::{debug, error, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CallProvider` against the Ultravox REST API.
#[derive(Clone)]
pub struct UltravoxAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl UltravoxAdapter {
    /// Creates a new `UltravoxAdapter`. `base_url` has no trailing slash.
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// `{base}/api/agents/{agent_id}/calls`, with the agent id encoded as a single segment.
    fn calls_url(&self, agent_id: &str) -> PortResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("invalid call provider URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("call provider URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "agents", agent_id, "calls"]);
        Ok(url)
    }
}

//=========================================================================================
// `CallProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl CallProvider for UltravoxAdapter {
    async fn create_call(&self, agent_id: &str) -> PortResult<serde_json::Value> {
        let url = self.calls_url(agent_id)?;
        info!("Creating call for agent: {}", agent_id);
        debug!("Request URL: {}", url);

        let response = self
            .client
            .post(url)
            .header("X-API-Key", &self.api_key)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        debug!("Call provider response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Call provider error: {} {}", status, body);
            return Err(PortError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let call: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        info!(
            "Call created successfully: {}",
            call.get("callId").and_then(|v| v.as_str()).unwrap_or("<no callId>")
        );
        Ok(call)
    }
}
