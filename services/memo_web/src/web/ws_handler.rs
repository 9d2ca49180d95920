//! services/memo_web/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each connection hosts one memo client: incoming messages become client
//! actions, and every view change is pushed back to the browser.

use crate::client::MemoClient;
use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    state::AppState,
};
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
use memo_share_core::view::View;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is shared between the view pusher and the message loop.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    let client = app_state.new_client();
    let closed = CancellationToken::new();

    // --- 1. View Push Task ---
    let push_task = {
        let views = client.subscribe_view();
        let ws_sender = ws_sender.clone();
        let closed = closed.clone();
        tokio::spawn(async move {
            push_views(views, ws_sender, closed).await;
        })
    };

    // --- 2. Main Message Loop ---
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_text_message(text.as_str(), &client, &ws_sender).await;
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive failed: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            }
        }
    }

    // --- 3. Cleanup ---
    closed.cancel();
    client.close();
    let _ = push_task.await;
    info!("WebSocket connection closed.");
}

/// Sends the current view, then one message per change until the connection closes.
async fn push_views(mut views: watch::Receiver<View>, ws_sender: WsSender, closed: CancellationToken) {
    loop {
        let view = views.borrow_and_update().clone();
        if send_message(&ws_sender, &ServerMessage::View { view }).await.is_err() {
            error!("Failed to push view; closing connection.");
            closed.cancel();
            return;
        }
        tokio::select! {
            _ = closed.cancelled() => return,
            changed = views.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Helper function to dispatch the different `ClientMessage` variants.
async fn handle_text_message(text: &str, client: &MemoClient, ws_sender: &WsSender) {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            let reply = ServerMessage::Error {
                message: format!("Unrecognised message: {}", e),
            };
            let _ = send_message(ws_sender, &reply).await;
            return;
        }
    };
    debug!("Client message: {:?}", client_msg);

    // Failures are already logged and turned into notices by the client.
    match client_msg {
        ClientMessage::SignIn { credential } => {
            let _ = client.sign_in(&credential).await;
        }
        ClientMessage::SignOut => {
            let _ = client.sign_out().await;
        }
        ClientMessage::SetNewNoteDraft { text } => client.set_new_note_draft(text).await,
        ClientMessage::AddNote => {
            let _ = client.add_note().await;
        }
        ClientMessage::BeginEdit { note_id } => {
            let _ = client.begin_edit(&note_id).await;
        }
        ClientMessage::SetEditDraft { text } => client.set_edit_draft(text).await,
        ClientMessage::SaveEdit => {
            let _ = client.save_edit().await;
        }
        ClientMessage::CancelEdit => client.cancel_edit().await,
        ClientMessage::DeleteNote { note_id } => {
            let _ = client.delete_note(&note_id).await;
        }
        ClientMessage::SetShareEmail { note_id, email } => {
            client.set_share_email(note_id, email).await
        }
        ClientMessage::ShareNote { note_id } => {
            let _ = client.share_note(&note_id).await;
        }
    }
}

async fn send_message(ws_sender: &WsSender, message: &ServerMessage) -> Result<(), ()> {
    let json = serde_json::to_string(message).map_err(|e| {
        error!("Failed to serialize server message: {}", e);
    })?;
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| {
            debug!("WebSocket send failed: {}", e);
        })
}
