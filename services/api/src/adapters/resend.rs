//! services/api/src/adapters/resend.rs
//!
//! This module contains the adapter for the Resend transactional email API.
//! It implements the `Mailer` port from the `core` crate.

use async_trait::async_trait;
use call_desk_core::ports::{Mailer, OutboundEmail, PortError, PortResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// An adapter that implements the `Mailer` port using the Resend API.
#[derive(Clone)]
pub struct ResendAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ResendAdapter {
    /// Creates a new `ResendAdapter`. `base_url` has no trailing slash.
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for ResendAdapter {
    async fn send_email(&self, email: &OutboundEmail) -> PortResult<Option<String>> {
        let body = SendEmailRequest {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            error!("Email provider error: {} {}", status, text);
            return Err(PortError::Upstream { status, body: text });
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        info!("Email sent successfully: {:?}", sent.id);
        Ok(sent.id)
    }
}
