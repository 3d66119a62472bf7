//! crates/call_desk_core/src/domain.rs
//!
//! Defines the core data structures for the call desk.
//! These structs carry serde derives so the web layer can return them directly,
//! but they are independent of any database library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Returned when a stored or submitted enum value is not one of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

//=========================================================================================
// Calls
//=========================================================================================

/// How a logged call ended at the telephony level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Completed,
    Missed,
    Voicemail,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Completed => "completed",
            CallStatus::Missed => "missed",
            CallStatus::Voicemail => "voicemail",
        }
    }
}

impl FromStr for CallStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(CallStatus::Completed),
            "missed" => Ok(CallStatus::Missed),
            "voicemail" => Ok(CallStatus::Voicemail),
            other => Err(UnknownVariant {
                kind: "call status",
                value: other.to_string(),
            }),
        }
    }
}

/// The outcome tag summarizing how a collections call concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    NoReconoceDeuda,
    NoLocalizado,
    AceptaPagar,
    AceptaPagarParte,
    Enfadado,
    CuelgaAntes,
    Other,
}

impl CallOutcome {
    pub const ALL: [CallOutcome; 7] = [
        CallOutcome::NoReconoceDeuda,
        CallOutcome::NoLocalizado,
        CallOutcome::AceptaPagar,
        CallOutcome::AceptaPagarParte,
        CallOutcome::Enfadado,
        CallOutcome::CuelgaAntes,
        CallOutcome::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::NoReconoceDeuda => "no_reconoce_deuda",
            CallOutcome::NoLocalizado => "no_localizado",
            CallOutcome::AceptaPagar => "acepta_pagar",
            CallOutcome::AceptaPagarParte => "acepta_pagar_parte",
            CallOutcome::Enfadado => "enfadado",
            CallOutcome::CuelgaAntes => "cuelga_antes",
            CallOutcome::Other => "other",
        }
    }

    /// Maps a stored tag to an outcome. Tags written by newer call-logging
    /// revisions fall back to `Other` instead of failing the whole listing.
    pub fn from_tag(tag: &str) -> Self {
        CallOutcome::ALL
            .into_iter()
            .find(|o| o.as_str() == tag)
            .unwrap_or(CallOutcome::Other)
    }
}

impl FromStr for CallOutcome {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallOutcome::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "call outcome",
                value: s.to_string(),
            })
    }
}

/// A call logged by the external call-logging process. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub duration: String,
    pub status: CallStatus,
    pub cost: f64,
    /// Empty when no recording is available.
    pub recording_url: String,
    pub phone_number: Option<String>,
    pub agent_id: Option<String>,
    pub summary: Option<String>,
    pub outcome: Option<CallOutcome>,
}

impl Call {
    pub fn has_recording(&self) -> bool {
        !self.recording_url.trim().is_empty()
    }
}

//=========================================================================================
// Tasks
//=========================================================================================

/// Which side of the collaboration owns a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Mc2,
    Telvia,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Mc2 => "mc2",
            TaskCategory::Telvia => "telvia",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Mc2 => "MC2",
            TaskCategory::Telvia => "Telvia",
        }
    }
}

impl FromStr for TaskCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mc2" => Ok(TaskCategory::Mc2),
            "telvia" => Ok(TaskCategory::Telvia),
            other => Err(UnknownVariant {
                kind: "task category",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shared to-do item. `completed_at == None` means the task is pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub category: TaskCategory,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// Selects which tasks a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    Pending,
    Completed,
    All,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::Pending => task.is_pending(),
            TaskFilter::Completed => !task.is_pending(),
            TaskFilter::All => true,
        }
    }
}

/// Fields a task edit may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub category: Option<TaskCategory>,
}

//=========================================================================================
// Messages and Documents
//=========================================================================================

/// Who wrote a message on the feedback board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    User,
    Agency,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Agency => "agency",
        }
    }
}

impl FromStr for SenderRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(SenderRole::User),
            "agency" => Ok(SenderRole::Agency),
            other => Err(UnknownVariant {
                kind: "sender role",
                value: other.to_string(),
            }),
        }
    }
}

/// A post on the shared feedback board. Any client may edit or delete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: SenderRole,
    pub text: String,
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A link to an external document shared with the agency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Agents and Auth
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Inactive,
}

/// A conversational-AI persona configured at the call provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: AgentStatus,
}

// Represents a login session issued after a successful login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
