//! In-memory fakes of the ports and a router wired to them.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{self, board::BoardHub, state::AppState};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use call_desk_core::domain::{Call, Document, Message, Task, TaskFilter, TaskPatch};
use call_desk_core::ports::{
    CallProvider, DatabaseService, Mailer, OutboundEmail, PortError, PortResult,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-session-token";
pub const TEST_USER: &str = "operador";
pub const TEST_PASSWORD: &str = "correct horse";

//=========================================================================================
// Database
//=========================================================================================

#[derive(Default)]
struct Tables {
    calls: Vec<Call>,
    tasks: Vec<Task>,
    messages: Vec<Message>,
    documents: Vec<Document>,
    sessions: HashMap<String, DateTime<Utc>>,
}

/// A store that keeps rows in memory. Writes can be made to fail on demand.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    pub fail_writes: AtomicBool,
    pauses: Mutex<HashMap<&'static str, Pause>>,
}

/// Holds one call to an operation after its write, until released.
struct Pause {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// The test's side of a [`MemoryDb::pause_after`].
pub struct PauseHandle {
    pub entered: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

impl MemoryDb {
    /// A store with one valid session for [`TEST_TOKEN`].
    pub fn new() -> Self {
        let db = Self::default();
        db.tables
            .lock()
            .unwrap()
            .sessions
            .insert(TEST_TOKEN.to_string(), Utc::now() + chrono::Duration::days(1));
        db
    }

    pub fn seed_calls(&self, calls: Vec<Call>) {
        self.tables.lock().unwrap().calls = calls;
    }

    pub fn seed_message(&self, message: Message) {
        self.tables.lock().unwrap().messages.push(message);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }

    /// Makes the next `op` (e.g. `"update_task"`) apply its write and then wait for release.
    pub fn pause_after(&self, op: &'static str) -> PauseHandle {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.pauses.lock().unwrap().insert(
            op,
            Pause {
                entered: entered_tx,
                release: release_rx,
            },
        );
        PauseHandle {
            entered: entered_rx,
            release: release_tx,
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tables.lock().unwrap().tasks.clone()
    }

    async fn hold(&self, op: &'static str) {
        let pause = self.pauses.lock().unwrap().remove(op);
        if let Some(pause) = pause {
            let _ = pause.entered.send(());
            let _ = pause.release.await;
        }
    }

    fn check_writable(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn list_calls(&self) -> PortResult<Vec<Call>> {
        Ok(self.tables.lock().unwrap().calls.clone())
    }

    async fn get_call(&self, call_id: &str) -> PortResult<Call> {
        self.tables
            .lock()
            .unwrap()
            .calls
            .iter()
            .find(|c| c.id == call_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Call {} not found", call_id)))
    }

    async fn list_tasks(&self, filter: TaskFilter) -> PortResult<Vec<Task>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: &Task) -> PortResult<Task> {
        self.check_writable()?;
        self.tables.lock().unwrap().tasks.push(task.clone());
        self.hold("create_task").await;
        Ok(task.clone())
    }

    async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> PortResult<Task> {
        self.check_writable()?;
        let updated = {
            let mut tables = self.tables.lock().unwrap();
            let task = tables
                .tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| PortError::NotFound(format!("Task {} not found", task_id)))?;
            if let Some(text) = &patch.text {
                task.text = text.clone();
            }
            if let Some(category) = patch.category {
                task.category = category;
            }
            task.clone()
        };
        self.hold("update_task").await;
        Ok(updated)
    }

    async fn set_task_completed_at(
        &self,
        task_id: Uuid,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Task> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PortError::NotFound(format!("Task {} not found", task_id)))?;
        task.completed_at = completed_at;
        Ok(task.clone())
    }

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != task_id);
        if tables.tasks.len() == before {
            return Err(PortError::NotFound(format!("Task {} not found", task_id)));
        }
        Ok(())
    }

    async fn list_messages(&self) -> PortResult<Vec<Message>> {
        Ok(self.tables.lock().unwrap().messages.clone())
    }

    async fn create_message(&self, message: &Message) -> PortResult<Message> {
        self.check_writable()?;
        self.tables.lock().unwrap().messages.push(message.clone());
        Ok(message.clone())
    }

    async fn update_message_text(&self, message_id: Uuid, text: &str) -> PortResult<Message> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| PortError::NotFound(format!("Message {} not found", message_id)))?;
        message.text = text.to_string();
        Ok(message.clone())
    }

    async fn delete_message(&self, message_id: Uuid) -> PortResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.messages.len();
        tables.messages.retain(|m| m.id != message_id);
        if tables.messages.len() == before {
            return Err(PortError::NotFound(format!("Message {} not found", message_id)));
        }
        Ok(())
    }

    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        Ok(self.tables.lock().unwrap().documents.clone())
    }

    async fn create_document(&self, document: &Document) -> PortResult<Document> {
        self.check_writable()?;
        self.tables.lock().unwrap().documents.push(document.clone());
        Ok(document.clone())
    }

    async fn delete_document(&self, document_id: Uuid) -> PortResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.documents.len();
        tables.documents.retain(|d| d.id != document_id);
        if tables.documents.len() == before {
            return Err(PortError::NotFound(format!("Document {} not found", document_id)));
        }
        Ok(())
    }

    async fn create_auth_session(&self, token: &str, expires_at: DateTime<Utc>) -> PortResult<()> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .insert(token.to_string(), expires_at);
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<()> {
        match self.tables.lock().unwrap().sessions.get(token) {
            Some(expires_at) if *expires_at > Utc::now() => Ok(()),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        self.tables.lock().unwrap().sessions.remove(token);
        Ok(())
    }
}

//=========================================================================================
// Providers
//=========================================================================================

/// Answers every call creation with a fixed body, or a fixed upstream error.
pub struct FakeCallProvider {
    response: Result<serde_json::Value, (u16, String)>,
    pub agent_ids: Mutex<Vec<String>>,
}

impl FakeCallProvider {
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            response: Ok(body),
            agent_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn upstream_error(status: u16, body: &str) -> Self {
        Self {
            response: Err((status, body.to_string())),
            agent_ids: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CallProvider for FakeCallProvider {
    async fn create_call(&self, agent_id: &str) -> PortResult<serde_json::Value> {
        self.agent_ids.lock().unwrap().push(agent_id.to_string());
        match &self.response {
            Ok(body) => Ok(body.clone()),
            Err((status, body)) => Err(PortError::Upstream {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// Records every email it is asked to send.
#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub fail: AtomicBool,
}

impl FakeMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_email(&self, email: &OutboundEmail) -> PortResult<Option<String>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Upstream {
                status: 422,
                body: "invalid from address".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(Some(format!("email-{}", sent.len())))
    }
}

//=========================================================================================
// App wiring
//=========================================================================================

pub fn hash_password(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "postgres://unused".to_string()),
        ("DASHBOARD_USERNAME".to_string(), TEST_USER.to_string()),
        ("DASHBOARD_PASSWORD_HASH".to_string(), hash_password(TEST_PASSWORD)),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
}

pub struct TestAppBuilder {
    db: Arc<MemoryDb>,
    config: Config,
    call_provider: Option<Arc<dyn CallProvider>>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            db: Arc::new(MemoryDb::new()),
            config: test_config(&[]),
            call_provider: None,
            mailer: None,
        }
    }

    pub fn db(mut self, db: Arc<MemoryDb>) -> Self {
        self.db = db;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn call_provider(mut self, provider: Arc<dyn CallProvider>) -> Self {
        self.call_provider = Some(provider);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub async fn build(self) -> TestApp {
        let board = Arc::new(BoardHub::new());
        board.resync(self.db.as_ref()).await.unwrap();
        let state = Arc::new(AppState {
            db: self.db.clone(),
            config: Arc::new(self.config),
            call_provider: self.call_provider,
            mailer: self.mailer,
            board,
        });
        TestApp {
            router: web::router(state.clone()),
            state,
            db: self.db,
        }
    }
}

impl TestApp {
    /// Sends an authenticated request; `body` is sent as JSON when present.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", TEST_TOKEN));
        self.send(builder, body).await
    }

    /// Sends a request without credentials.
    pub async fn anonymous(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        self.send(builder, body).await
    }

    pub async fn send(
        &self,
        builder: axum::http::request::Builder,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }
}
