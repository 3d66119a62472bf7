//! services/api/src/web/voice.rs
//!
//! The voice-session bridge used by the agents playground. The browser keeps
//! the vendor SDK and forwards its status events here; the server creates the
//! call, hands back the join handle and answers every transition with the text
//! to display.

use crate::web::{
    protocol::{VoiceClientMessage, VoiceServerMessage},
    relay::MISSING_KEY_MESSAGE,
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use call_desk_core::ports::{CallProvider, PortError};
use call_desk_core::voice::{StatusUpdate, VoiceSession, VoiceStatus};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to voice-bridge WebSocket connections.
pub async fn voice_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_voice_socket(socket, app_state))
}

async fn handle_voice_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New voice bridge connection.");
    let (mut sender, mut receiver) = socket.split();
    let mut session = VoiceSession::new();

    'connection: while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let client_msg = match serde_json::from_str::<VoiceClientMessage>(text.as_str()) {
            Ok(client_msg) => client_msg,
            Err(e) => {
                warn!("Failed to deserialize voice message: {}", e);
                continue;
            }
        };

        let provider = app_state.call_provider.as_deref();
        for reply in handle_voice_message(provider, &mut session, client_msg).await {
            let ended = reply == VoiceServerMessage::Ended;
            let json = match serde_json::to_string(&reply) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize voice message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                error!("Failed to send voice message, dropping connection.");
                break 'connection;
            }
            if ended {
                let _ = sender.send(Message::Close(None)).await;
                break 'connection;
            }
        }
    }

    if session.is_active() {
        info!("Voice bridge closed with an active call {:?}.", session.call_id());
    }
    info!("Voice bridge connection closed.");
}

/// Advances `session` for one client message and returns the replies to send, in order.
pub async fn handle_voice_message(
    provider: Option<&dyn CallProvider>,
    session: &mut VoiceSession,
    msg: VoiceClientMessage,
) -> Vec<VoiceServerMessage> {
    match msg {
        VoiceClientMessage::Start { agent_id } => {
            let agent_id = agent_id.trim().to_string();
            if agent_id.is_empty() {
                return vec![VoiceServerMessage::Error {
                    message: "agentId is required".to_string(),
                }];
            }
            let mut replies = vec![status(session.start(&agent_id))];

            let Some(provider) = provider else {
                replies.push(VoiceServerMessage::Error {
                    message: MISSING_KEY_MESSAGE.to_string(),
                });
                replies.push(status(session.fail()));
                return replies;
            };

            // The join handle only exists once the call has been created.
            match provider.create_call(&agent_id).await.and_then(join_handle) {
                Ok((join_url, call_id)) => {
                    replies.push(VoiceServerMessage::JoinReady {
                        join_url: join_url.clone(),
                        call_id: call_id.clone(),
                    });
                    replies.push(status(session.joined(join_url, call_id)));
                }
                Err(e) => {
                    error!("Error starting call: {:?}", e);
                    replies.push(VoiceServerMessage::Error {
                        message: describe(&e),
                    });
                    replies.push(status(session.fail()));
                }
            }
            replies
        }
        VoiceClientMessage::Status { state } => {
            if session.join_url().is_none() {
                warn!("Status '{}' received before the call was joined.", state);
                return vec![VoiceServerMessage::Error {
                    message: "No active call".to_string(),
                }];
            }
            match state.parse::<VoiceStatus>() {
                Ok(voice_status) => vec![status(session.apply_status(voice_status))],
                Err(e) => {
                    warn!("Ignoring voice status: {}", e);
                    Vec::new()
                }
            }
        }
        VoiceClientMessage::Transcript { text, speaker } => {
            info!(
                "Transcript [{}]: {}",
                speaker.as_deref().unwrap_or("?"),
                text.as_deref().unwrap_or_default()
            );
            Vec::new()
        }
        VoiceClientMessage::End => {
            vec![status(session.teardown()), VoiceServerMessage::Ended]
        }
    }
}

fn status(update: StatusUpdate) -> VoiceServerMessage {
    VoiceServerMessage::Status {
        display: update.display,
        active: update.active,
    }
}

/// Pulls `joinUrl` and `callId` out of the provider's call-creation body.
fn join_handle(call: serde_json::Value) -> Result<(String, Option<String>), PortError> {
    let join_url = call
        .get("joinUrl")
        .and_then(|v| v.as_str())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| PortError::Unexpected("No joinUrl received from API".to_string()))?
        .to_string();
    let call_id = call.get("callId").and_then(|v| v.as_str()).map(str::to_string);
    Ok((join_url, call_id))
}

fn describe(err: &PortError) -> String {
    match err {
        PortError::Upstream { status, .. } => {
            format!("HTTP error! status: {} - Failed to create call", status)
        }
        other => other.to_string(),
    }
}
