//! services/api/src/web/ws_handler.rs
//!
//! The board push stream. A subscriber first receives a snapshot and then every
//! change the hub publishes, replacing the old fixed-interval polling.

use crate::web::{protocol::BoardEvent, state::AppState};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to board WebSocket connections.
pub async fn board_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_board_socket(socket, app_state))
}

async fn handle_board_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New board subscriber connected.");

    let (mut sender, mut receiver) = socket.split();
    // Subscribe before reading the snapshot so no change falls between the two.
    let events = app_state.board.subscribe();
    let snapshot = app_state.board.snapshot().await;
    if send_event(&mut sender, &snapshot).await.is_err() {
        error!("Failed to send the initial board snapshot.");
        return;
    }

    let token = CancellationToken::new();
    let forwarder = {
        let token = token.clone();
        let app_state = app_state.clone();
        tokio::spawn(forward_events(sender, events, app_state, token))
    };

    // The client never sends anything meaningful; we only watch for the close.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    token.cancel();
    if let Err(e) = forwarder.await {
        warn!("Board forwarder ended abnormally: {:?}", e);
    }
    info!("Board subscriber disconnected.");
}

async fn forward_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut events: tokio::sync::broadcast::Receiver<BoardEvent>,
    app_state: Arc<AppState>,
    token: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            received = events.recv() => received,
        };
        let event = match event {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Board subscriber lagged by {} events, resending snapshot.", skipped);
                app_state.board.snapshot().await
            }
            Err(RecvError::Closed) => break,
        };
        if send_event(&mut sender, &event).await.is_err() {
            info!("Board subscriber went away.");
            break;
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &BoardEvent,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize board event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}
