use crate::app_state::AppState;
use crate::game::handlers::{
    handle_create_room, handle_disconnect, handle_join_room, handle_make_move, handle_new_game,
    ConnSession,
};
use crate::game::message::ServerEvent;

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

#[axum::debug_handler]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl axum::response::IntoResponse {
    info!("WebSocket connection attempt received");

    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_socket(socket, state).await {
            error!("WebSocket processing failed: {}", e);
        }
    })
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) -> Result<()> {
    let mut rx = state.tx.subscribe();
    let mut session: Option<ConnSession> = None;

    info!("WebSocket connection established");
    let result = connection_loop(&mut socket, &state, &mut rx, &mut session).await;

    // Runs whether the client closed cleanly or the connection errored out.
    if let Some(session) = session {
        handle_disconnect(&session, &state).await;
    }
    result
}

/// Per-connection loop: inbound frames are dispatched to the game handlers,
/// while room broadcasts arriving on the shared channel are forwarded to the
/// socket once the connection is attached to a room.
async fn connection_loop(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    rx: &mut broadcast::Receiver<(String, ServerEvent)>,
    session: &mut Option<ConnSession>,
) -> Result<()> {
    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let Some(Ok(msg)) = inbound else {
                    debug!("WebSocket stream ended");
                    break;
                };
                match msg {
                    Message::Text(text) => {
                        let parsed: serde_json::Value = match serde_json::from_str(&text) {
                            Ok(json) => json,
                            Err(_) => {
                                error!("Failed to parse WebSocket message: {}", text);
                                continue;
                            }
                        };

                        match parsed["type"].as_str() {
                            Some("create-room") => {
                                if let Some(opened) =
                                    handle_create_room(&parsed, state, socket).await?
                                {
                                    *session = Some(opened);
                                }
                            }
                            Some("join-room") => {
                                if let Some(joined) =
                                    handle_join_room(&parsed, state, socket).await?
                                {
                                    *session = Some(joined);
                                }
                            }
                            Some("make-move") => {
                                handle_make_move(&parsed, state, socket).await?;
                            }
                            Some("new-game") => {
                                handle_new_game(&parsed, state, socket).await?;
                            }
                            _ => error!("Unknown message type received: {:?}", parsed["type"]),
                        }
                    }
                    Message::Ping(data) => {
                        socket.send(Message::Pong(data)).await?;
                    }
                    Message::Pong(_) => {}
                    Message::Close(reason) => {
                        info!("WebSocket closed: {:?}", reason);
                        break;
                    }
                    _ => debug!("Ignoring non-text WebSocket message"),
                }
            }

            outbound = rx.recv() => {
                let Ok((room_id, event)) = outbound else {
                    // Lagged or channel closed; the next recv resynchronizes.
                    continue;
                };
                let subscribed = session
                    .as_ref()
                    .is_some_and(|s| s.room_id == room_id);
                if subscribed {
                    let payload = serde_json::to_string(&event)?;
                    socket.send(Message::Text(payload.into())).await?;
                }
            }
        }
    }

    Ok(())
}
