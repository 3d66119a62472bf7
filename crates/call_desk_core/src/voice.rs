//! crates/call_desk_core/src/voice.rs
//!
//! Status bookkeeping for a browser voice session. Media negotiation and
//! reconnection belong to the vendor SDK; this module only turns its status
//! events into the text and active flag the playground shows.

use serde::Serialize;
use std::str::FromStr;

use crate::domain::UnknownVariant;

pub const STARTING_TEXT: &str = "Iniciando llamada...";
pub const ACTIVE_TEXT: &str = "Llamada activa";
pub const FAILED_TEXT: &str = "Error al iniciar llamada";

/// Session states reported by the vendor SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceStatus {
    Idle,
    Connecting,
    Listening,
    Thinking,
    Speaking,
    Disconnecting,
    Disconnected,
    Error,
}

impl VoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceStatus::Idle => "idle",
            VoiceStatus::Connecting => "connecting",
            VoiceStatus::Listening => "listening",
            VoiceStatus::Thinking => "thinking",
            VoiceStatus::Speaking => "speaking",
            VoiceStatus::Disconnecting => "disconnecting",
            VoiceStatus::Disconnected => "disconnected",
            VoiceStatus::Error => "error",
        }
    }

    /// Whether the session is over once this state is reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VoiceStatus::Disconnected | VoiceStatus::Error)
    }
}

impl FromStr for VoiceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(VoiceStatus::Idle),
            "connecting" => Ok(VoiceStatus::Connecting),
            "listening" => Ok(VoiceStatus::Listening),
            "thinking" => Ok(VoiceStatus::Thinking),
            "speaking" => Ok(VoiceStatus::Speaking),
            "disconnecting" => Ok(VoiceStatus::Disconnecting),
            "disconnected" => Ok(VoiceStatus::Disconnected),
            "error" => Ok(VoiceStatus::Error),
            _ => Err(UnknownVariant {
                kind: "voice status",
                value: s.to_string(),
            }),
        }
    }
}

/// What the UI should display after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub display: String,
    pub active: bool,
}

/// One test call from the agents playground.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceSession {
    agent_id: Option<String>,
    join_url: Option<String>,
    call_id: Option<String>,
    status: Option<VoiceStatus>,
    active: bool,
    display: String,
}

impl VoiceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn join_url(&self) -> Option<&str> {
        self.join_url.as_deref()
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn status(&self) -> Option<VoiceStatus> {
        self.status
    }

    /// True between `start` and either `joined` or `fail`.
    pub fn is_starting(&self) -> bool {
        self.agent_id.is_some() && self.join_url.is_none() && self.display == STARTING_TEXT
    }

    pub fn start(&mut self, agent_id: &str) -> StatusUpdate {
        *self = Self {
            agent_id: Some(agent_id.to_string()),
            ..Self::default()
        };
        self.show(STARTING_TEXT.to_string())
    }

    /// Records the join handle. The call is live from here on.
    pub fn joined(&mut self, join_url: String, call_id: Option<String>) -> StatusUpdate {
        self.join_url = Some(join_url);
        self.call_id = call_id;
        self.active = true;
        self.show(ACTIVE_TEXT.to_string())
    }

    pub fn apply_status(&mut self, status: VoiceStatus) -> StatusUpdate {
        self.status = Some(status);
        if status.is_terminal() {
            self.active = false;
        }
        self.show(format!("Estado: {}", status.as_str()))
    }

    pub fn fail(&mut self) -> StatusUpdate {
        self.active = false;
        self.show(FAILED_TEXT.to_string())
    }

    /// Explicit hang-up from the UI. Clears the status line.
    pub fn teardown(&mut self) -> StatusUpdate {
        *self = Self::default();
        self.show(String::new())
    }

    fn show(&mut self, display: String) -> StatusUpdate {
        self.display = display;
        StatusUpdate {
            display: self.display.clone(),
            active: self.active,
        }
    }
}
