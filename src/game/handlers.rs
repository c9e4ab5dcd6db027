use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use std::sync::Arc;
use tracing::{error, info};

use crate::app_state::AppState;
use crate::game::message::{
    CreateRoomRequest, JoinRoomRequest, MoveRequest, NewGameRequest, ServerEvent,
};

/// What a connection is attached to once its client created or joined a
/// room; carried by the socket loop and used for disconnect teardown.
#[derive(Debug, Clone)]
pub struct ConnSession {
    pub room_id: String,
    pub user_id: String,
    pub player_name: String,
}

pub async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<()> {
    let payload = serde_json::to_string(event)?;
    socket.send(Message::Text(payload.into())).await?;
    Ok(())
}

async fn send_error(socket: &mut WebSocket, message: String) -> Result<()> {
    error!("Rejected request: {}", message);
    send_event(socket, &ServerEvent::Error { message }).await
}

pub async fn handle_create_room(
    parsed: &serde_json::Value,
    state: &Arc<AppState>,
    socket: &mut WebSocket,
) -> Result<Option<ConnSession>> {
    let req: CreateRoomRequest = match serde_json::from_value(parsed.clone()) {
        Ok(req) => req,
        Err(err) => {
            send_error(socket, format!("Invalid create-room payload: {err}")).await?;
            return Ok(None);
        }
    };

    let (room_id, handle) = state
        .registry
        .create_room(req.user_id.clone(), req.user_name.clone())
        .await;
    {
        let game = handle.lock().await;
        state.registry.mirror(&game).await;
    }

    info!("Player {} opened room {}", req.user_name, room_id);
    send_event(
        socket,
        &ServerEvent::RoomCreated {
            room_id: room_id.clone(),
            message: format!("Room {room_id} created. Waiting for an opponent."),
        },
    )
    .await?;

    Ok(Some(ConnSession {
        room_id,
        user_id: req.user_id,
        player_name: req.user_name,
    }))
}

pub async fn handle_join_room(
    parsed: &serde_json::Value,
    state: &Arc<AppState>,
    socket: &mut WebSocket,
) -> Result<Option<ConnSession>> {
    let req: JoinRoomRequest = match serde_json::from_value(parsed.clone()) {
        Ok(req) => req,
        Err(err) => {
            send_error(socket, format!("Invalid join-room payload: {err}")).await?;
            return Ok(None);
        }
    };

    let handle = match state.registry.get_or_recover(&req.room_id).await {
        Ok(handle) => handle,
        Err(err) => {
            send_error(socket, err.to_string()).await?;
            return Ok(None);
        }
    };

    let mut game = handle.lock().await;
    if let Err(err) = game.join(req.user_id.clone(), req.user_name.clone()) {
        send_error(socket, err.to_string()).await?;
        return Ok(None);
    }
    state.registry.mirror(&game).await;

    info!("Player {} joined room {}", req.user_name, req.room_id);
    state.broadcast(
        &req.room_id,
        ServerEvent::PlayerJoined {
            players: game.players.clone(),
            message: format!("{} joined the room.", req.user_name),
        },
    );
    state.broadcast(
        &req.room_id,
        ServerEvent::GameStarted {
            board: game.board.clone(),
            current_player: game.current_player,
            scores: game.scores(),
        },
    );

    Ok(Some(ConnSession {
        room_id: req.room_id,
        user_id: req.user_id,
        player_name: req.user_name,
    }))
}

pub async fn handle_make_move(
    parsed: &serde_json::Value,
    state: &Arc<AppState>,
    socket: &mut WebSocket,
) -> Result<()> {
    let req: MoveRequest = match serde_json::from_value(parsed.clone()) {
        Ok(req) => req,
        Err(err) => {
            return send_error(socket, format!("Invalid make-move payload: {err}")).await;
        }
    };

    let handle = match state.registry.get(&req.room_id).await {
        Ok(handle) => handle,
        Err(err) => return send_error(socket, err.to_string()).await,
    };

    let mut game = handle.lock().await;
    let outcome = match game.make_move(req.player_index, req.row, req.col, req.letter) {
        Ok(outcome) => outcome,
        Err(err) => return send_error(socket, err.to_string()).await,
    };
    state.registry.mirror(&game).await;

    info!(
        "Move applied in room {}: player {} placed {:?} at ({}, {}), {} new line(s)",
        req.room_id, req.player_index, req.letter, req.row, req.col, outcome.sos_count
    );
    state.broadcast(
        &req.room_id,
        ServerEvent::MoveMade {
            row: req.row,
            col: req.col,
            letter: req.letter,
            player_index: req.player_index,
            scores: game.scores(),
            current_player: game.current_player,
            sos_count: outcome.sos_count,
        },
    );
    if outcome.finished {
        info!("Room {} finished, winner: {:?}", req.room_id, outcome.winner);
        state.broadcast(
            &req.room_id,
            ServerEvent::GameOver {
                scores: game.scores(),
                winner: outcome.winner,
            },
        );
    }

    Ok(())
}

pub async fn handle_new_game(
    parsed: &serde_json::Value,
    state: &Arc<AppState>,
    socket: &mut WebSocket,
) -> Result<()> {
    let req: NewGameRequest = match serde_json::from_value(parsed.clone()) {
        Ok(req) => req,
        Err(err) => {
            return send_error(socket, format!("Invalid new-game payload: {err}")).await;
        }
    };

    let handle = match state.registry.get(&req.room_id).await {
        Ok(handle) => handle,
        Err(err) => return send_error(socket, err.to_string()).await,
    };

    let mut game = handle.lock().await;
    game.new_game();
    state.registry.mirror(&game).await;

    info!("Room {} reset for a new game", req.room_id);
    state.broadcast(
        &req.room_id,
        ServerEvent::GameStarted {
            board: game.board.clone(),
            current_player: game.current_player,
            scores: game.scores(),
        },
    );

    Ok(())
}

/// A participant dropped: tell the other side, mirror the final snapshot,
/// then tear the live match down. The session is not resumable afterwards
/// unless the snapshot still shows an unfinished match.
pub async fn handle_disconnect(session: &ConnSession, state: &Arc<AppState>) {
    info!(
        "Player {} ({}) left room {}",
        session.player_name, session.user_id, session.room_id
    );
    state.broadcast(
        &session.room_id,
        ServerEvent::PlayerLeft {
            user_id: session.user_id.clone(),
            player_name: session.player_name.clone(),
        },
    );

    if let Some(handle) = state.registry.remove(&session.room_id).await {
        let game = handle.lock().await;
        state.registry.mirror(&game).await;
    }
}
