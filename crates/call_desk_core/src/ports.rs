//! crates/call_desk_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the call desk.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the hosted database, the call provider and the email provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Call, Document, Message, Task, TaskFilter, TaskPatch};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The remote provider answered with a non-success status. `body` is kept verbatim.
    #[error("Upstream responded with status {status}")]
    Upstream { status: u16, body: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Calls (read-only) ---
    async fn list_calls(&self) -> PortResult<Vec<Call>>;

    async fn get_call(&self, call_id: &str) -> PortResult<Call>;

    // --- Tasks ---
    async fn list_tasks(&self, filter: TaskFilter) -> PortResult<Vec<Task>>;

    async fn create_task(&self, task: &Task) -> PortResult<Task>;

    async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> PortResult<Task>;

    /// Sets or clears `completed_at`. Clearing it restores the task to pending.
    async fn set_task_completed_at(
        &self,
        task_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Task>;

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()>;

    // --- Message board ---
    async fn list_messages(&self) -> PortResult<Vec<Message>>;

    async fn create_message(&self, message: &Message) -> PortResult<Message>;

    async fn update_message_text(&self, message_id: Uuid, text: &str) -> PortResult<Message>;

    async fn delete_message(&self, message_id: Uuid) -> PortResult<()>;

    // --- Documents ---
    async fn list_documents(&self) -> PortResult<Vec<Document>>;

    async fn create_document(&self, document: &Document) -> PortResult<Document>;

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()>;

    // --- Auth sessions ---
    async fn create_auth_session(&self, token: &str, expires_at: DateTime<Utc>)
        -> PortResult<()>;

    /// Succeeds only for an existing, unexpired token.
    async fn validate_auth_session(&self, token: &str) -> PortResult<()>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;
}

#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Creates a call for the given agent and returns the provider's JSON body untouched.
    ///
    /// A non-success answer from the provider is reported as `PortError::Upstream`.
    async fn create_call(&self, agent_id: &str) -> PortResult<serde_json::Value>;
}

/// A rendered email ready to hand to the email provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email and returns the provider's message id when it reports one.
    async fn send_email(&self, email: &OutboundEmail) -> PortResult<Option<String>>;
}
