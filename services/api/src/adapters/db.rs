//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the hosted PostgreSQL backend using `sqlx`.

use async_trait::async_trait;
use call_desk_core::domain::{
    Call, CallOutcome, CallStatus, Document, Message, SenderRole, Task, TaskCategory,
    TaskFilter, TaskPatch,
};
use call_desk_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const CALL_COLUMNS: &str = "id, created_at, duration, status, cost, recording_url, phone_number, agent_id, summary, outcome";
const TASK_COLUMNS: &str = "id, text, category, created_at, completed_at";
const MESSAGE_COLUMNS: &str = "id, sender, text, author_name, created_at";
const DOCUMENT_COLUMNS: &str = "id, name, url, created_at";

#[derive(FromRow)]
struct CallRecord {
    id: String,
    created_at: DateTime<Utc>,
    duration: String,
    status: String,
    cost: f64,
    recording_url: Option<String>,
    phone_number: Option<String>,
    agent_id: Option<String>,
    summary: Option<String>,
    outcome: Option<String>,
}
impl CallRecord {
    fn to_domain(self) -> PortResult<Call> {
        let status = self
            .status
            .parse::<CallStatus>()
            .map_err(|e| PortError::Unexpected(format!("call {}: {}", self.id, e)))?;
        Ok(Call {
            id: self.id,
            created_at: self.created_at,
            duration: self.duration,
            status,
            cost: self.cost,
            recording_url: self.recording_url.unwrap_or_default(),
            phone_number: self.phone_number,
            agent_id: self.agent_id,
            summary: self.summary,
            outcome: self.outcome.as_deref().map(CallOutcome::from_tag),
        })
    }
}

#[derive(FromRow)]
struct TaskRecord {
    id: Uuid,
    text: String,
    category: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}
impl TaskRecord {
    fn to_domain(self) -> PortResult<Task> {
        let category = self
            .category
            .parse::<TaskCategory>()
            .map_err(|e| PortError::Unexpected(format!("task {}: {}", self.id, e)))?;
        Ok(Task {
            id: self.id,
            text: self.text,
            category,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    sender: String,
    text: String,
    author_name: Option<String>,
    created_at: DateTime<Utc>,
}
impl MessageRecord {
    fn to_domain(self) -> PortResult<Message> {
        let sender = self
            .sender
            .parse::<SenderRole>()
            .map_err(|e| PortError::Unexpected(format!("message {}: {}", self.id, e)))?;
        Ok(Message {
            id: self.id,
            sender,
            text: self.text,
            author_name: self.author_name,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    name: String,
    url: String,
    created_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            name: self.name,
            url: self.url,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_calls(&self) -> PortResult<Vec<Call>> {
        let records = sqlx::query_as::<_, CallRecord>(&format!(
            "SELECT {CALL_COLUMNS} FROM calls ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_call(&self, call_id: &str) -> PortResult<Call> {
        sqlx::query_as::<_, CallRecord>(&format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = $1"))
            .bind(call_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Call {} not found", call_id)))?
            .to_domain()
    }

    async fn list_tasks(&self, filter: TaskFilter) -> PortResult<Vec<Task>> {
        let query = match filter {
            TaskFilter::Pending => format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE completed_at IS NULL ORDER BY created_at DESC"
            ),
            TaskFilter::Completed => format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE completed_at IS NOT NULL ORDER BY completed_at DESC"
            ),
            TaskFilter::All => format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"),
        };
        let records = sqlx::query_as::<_, TaskRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_task(&self, task: &Task) -> PortResult<Task> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            "INSERT INTO tasks (id, text, category, created_at, completed_at) VALUES ($1, $2, $3, $4, $5) RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.id)
        .bind(&task.text)
        .bind(task.category.as_str())
        .bind(task.created_at)
        .bind(task.completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?
        .to_domain()
    }

    async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> PortResult<Task> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            "UPDATE tasks SET text = COALESCE($2, text), category = COALESCE($3, category) WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(patch.text.as_deref())
        .bind(patch.category.map(|c| c.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Task {} not found", task_id)))?
        .to_domain()
    }

    async fn set_task_completed_at(
        &self,
        task_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Task> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            "UPDATE tasks SET completed_at = $2 WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(task_id)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Task {} not found", task_id)))?
        .to_domain()
    }

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Task {} not found", task_id)));
        }
        Ok(())
    }

    async fn list_messages(&self) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_message(&self, message: &Message) -> PortResult<Message> {
        sqlx::query_as::<_, MessageRecord>(&format!(
            "INSERT INTO messages (id, sender, text, author_name, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.id)
        .bind(message.sender.as_str())
        .bind(&message.text)
        .bind(message.author_name.as_deref())
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?
        .to_domain()
    }

    async fn update_message_text(&self, message_id: Uuid, text: &str) -> PortResult<Message> {
        sqlx::query_as::<_, MessageRecord>(&format!(
            "UPDATE messages SET text = $2 WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Message {} not found", message_id)))?
        .to_domain()
    }

    async fn delete_message(&self, message_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Message {} not found", message_id)));
        }
        Ok(())
    }

    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        let records = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_document(&self, document: &Document) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "INSERT INTO documents (id, name, url, created_at) VALUES ($1, $2, $3, $4) RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(document.id)
        .bind(&document.name)
        .bind(&document.url)
        .bind(document.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {} not found", document_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        // Expired sessions are dropped on each login.
        sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("INSERT INTO auth_sessions (token, expires_at) VALUES ($1, $2)")
            .bind(token)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<()> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT token FROM auth_sessions WHERE token = $1 AND expires_at > now()")
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;
        found.map(|_| ()).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
