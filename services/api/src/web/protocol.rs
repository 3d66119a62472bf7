//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocols between the browser and the API server:
//! the board push stream and the voice-session bridge.

use call_desk_core::domain::{Message, Task};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Board Stream (Server to Client only)
//=========================================================================================

/// Changes pushed to every `/ws/board` subscriber.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    /// The full board. Sent on connect and whenever the store's copy replaced local state.
    Snapshot {
        tasks: Vec<Task>,
        messages: Vec<Message>,
    },
    TaskUpserted { task: Task },
    TaskRemoved { id: Uuid },
    MessageUpserted { message: Message },
    MessageRemoved { id: Uuid },
}

//=========================================================================================
// Voice Bridge: Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceClientMessage {
    /// Asks the server to create a call for the agent. Must precede any status event.
    Start { agent_id: String },

    /// A status change reported by the vendor SDK (e.g. "speaking").
    Status { state: String },

    /// A transcript event from the vendor SDK. Only logged.
    Transcript {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        speaker: Option<String>,
    },

    /// The user hung up.
    End,
}

//=========================================================================================
// Voice Bridge: Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceServerMessage {
    /// The text and active flag the playground should show.
    Status { display: String, active: bool },

    /// The call exists; the browser SDK may now join it.
    JoinReady {
        join_url: String,
        call_id: Option<String>,
    },

    /// A non-fatal problem the UI may show next to the status line.
    Error { message: String },

    /// The session is over and the server is closing the socket.
    Ended,
}
