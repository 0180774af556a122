//! Real-time relay.
//!
//! A connection joins at most one canvas room at a time. `joinCanvas` is
//! answered with `loadCanvas` or `unauthorized`; each accepted
//! `drawingUpdate` replaces the stored snapshot and is relayed to the other
//! room members as `receiveDrawingUpdate`.

use crate::state::{AppState, RoomFrame};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use inkboard_core::elements::DrawingElement;
use inkboard_core::sync::{ClientMessage, Denial, ServerMessage};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The canvas a connection has joined and who joined it.
struct Joined {
    canvas_id: String,
    user_id: String,
    rx: broadcast::Receiver<RoomFrame>,
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode {:?}: {}", msg, e);
            true
        }
    }
}

fn unauthorized(message: impl Into<String>) -> ServerMessage {
    ServerMessage::Unauthorized(Denial {
        message: message.into(),
    })
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let peer_id = Uuid::new_v4().to_string();
    info!("New connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let mut joined: Option<Joined> = None;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                };
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Invalid message from {}: {}", peer_id, e);
                        continue;
                    }
                };

                let reply = match client_msg {
                    ClientMessage::JoinCanvas { canvas_id, token } => {
                        if let Some(old) = joined.take() {
                            state.leave_room(&old.canvas_id, &peer_id);
                        }
                        match join(&state, &peer_id, &canvas_id, &token) {
                            Ok((session, elements)) => {
                                info!(
                                    "Peer {} joined canvas {} ({} connected)",
                                    peer_id,
                                    canvas_id,
                                    state.peer_count(&canvas_id)
                                );
                                joined = Some(session);
                                ServerMessage::LoadCanvas(elements)
                            }
                            Err(reason) => {
                                warn!("Peer {} refused canvas {}: {}", peer_id, canvas_id, reason);
                                unauthorized(reason)
                            }
                        }
                    }
                    ClientMessage::DrawingUpdate { canvas_id, elements } => {
                        let accepted =
                            accept_update(&state, &peer_id, joined.as_ref(), &canvas_id, elements);
                        match accepted {
                            Ok(()) => continue,
                            Err(reason) => {
                                warn!(
                                    "Peer {} update to {} rejected: {}",
                                    peer_id, canvas_id, reason
                                );
                                unauthorized(reason)
                            }
                        }
                    }
                };
                if !send(&mut sender, &reply).await {
                    break;
                }
            }

            msg = async {
                match &mut joined {
                    Some(session) => session.rx.recv().await,
                    None => std::future::pending().await,
                }
            } => {
                match msg {
                    Ok((from, json)) => {
                        // Don't echo back to sender
                        if from != peer_id
                            && sender.send(Message::Text(json.into())).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Peer {} lagged behind by {} updates", peer_id, skipped);
                    }
                    Err(RecvError::Closed) => {
                        // room dropped with its canvas
                        joined = None;
                    }
                }
            }
        }
    }

    if let Some(session) = joined {
        state.leave_room(&session.canvas_id, &peer_id);
    }
    info!("Connection closed: {}", peer_id);
}

/// Check the token and canvas access, then subscribe to the room.
fn join(
    state: &AppState,
    peer_id: &str,
    canvas_id: &str,
    token: &str,
) -> Result<(Joined, Vec<DrawingElement>), String> {
    let user_id = state
        .authenticate(token)
        .ok_or_else(|| "Invalid or expired token".to_string())?;
    let elements = state
        .load_canvas(&user_id, canvas_id)
        .map_err(|e| e.to_string())?;
    let rx = state.join_room(canvas_id, peer_id);
    Ok((
        Joined {
            canvas_id: canvas_id.to_string(),
            user_id,
            rx,
        },
        elements,
    ))
}

/// Store and relay an update from a joined peer that still has access.
fn accept_update(
    state: &AppState,
    peer_id: &str,
    joined: Option<&Joined>,
    canvas_id: &str,
    elements: Vec<DrawingElement>,
) -> Result<(), String> {
    let session = joined
        .filter(|s| s.canvas_id == canvas_id)
        .ok_or_else(|| "Join the canvas before drawing".to_string())?;
    state
        .can_edit(&session.user_id, canvas_id)
        .map_err(|e| e.to_string())?;

    let relay = ServerMessage::ReceiveDrawingUpdate(elements.clone());
    state
        .store_elements(canvas_id, elements)
        .map_err(|e| e.to_string())?;
    match serde_json::to_string(&relay) {
        Ok(json) => state.broadcast(canvas_id, peer_id, json),
        Err(e) => warn!("Failed to encode relay for {}: {}", canvas_id, e),
    }
    Ok(())
}
