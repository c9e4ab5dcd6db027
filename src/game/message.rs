use serde::{Deserialize, Serialize};

use crate::game::board::{Board, Letter};
use crate::game::engine::Player;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub row: usize,
    pub col: usize,
    pub letter: Letter,
    #[serde(rename = "playerIndex")]
    pub player_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct NewGameRequest {
    #[serde(rename = "roomId")]
    pub room_id: String,
}

/// Everything the server pushes to clients. `error` goes only to the
/// originating connection; the rest are broadcast to the room.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "room-created")]
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: String,
        message: String,
    },
    #[serde(rename = "player-joined")]
    PlayerJoined {
        players: Vec<Player>,
        message: String,
    },
    #[serde(rename = "game-started")]
    GameStarted {
        board: Board,
        #[serde(rename = "currentPlayer")]
        current_player: usize,
        scores: Vec<u32>,
    },
    #[serde(rename = "move-made")]
    MoveMade {
        row: usize,
        col: usize,
        letter: Letter,
        #[serde(rename = "playerIndex")]
        player_index: usize,
        scores: Vec<u32>,
        #[serde(rename = "currentPlayer")]
        current_player: usize,
        #[serde(rename = "sosCount")]
        sos_count: u32,
    },
    #[serde(rename = "game-over")]
    GameOver {
        scores: Vec<u32>,
        /// Winning player index, `null` on a tie.
        winner: Option<usize>,
    },
    #[serde(rename = "player-left")]
    PlayerLeft {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "playerName")]
        player_name: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_deserialize_from_wire_payloads() {
        let req: CreateRoomRequest = serde_json::from_value(json!({
            "type": "create-room", "userId": "u1", "userName": "Alice"
        }))
        .unwrap();
        assert_eq!(req.user_id, "u1");

        let req: MoveRequest = serde_json::from_value(json!({
            "type": "make-move", "roomId": "AB12CD",
            "row": 0, "col": 1, "letter": "O", "playerIndex": 1
        }))
        .unwrap();
        assert_eq!(req.letter, Letter::O);
        assert_eq!(req.player_index, 1);
    }

    #[test]
    fn events_carry_the_type_tag() {
        let event = ServerEvent::MoveMade {
            row: 2,
            col: 3,
            letter: Letter::S,
            player_index: 0,
            scores: vec![1, 0],
            current_player: 0,
            sos_count: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "move-made");
        assert_eq!(json["letter"], "S");
        assert_eq!(json["sosCount"], 1);
        assert_eq!(json["currentPlayer"], 0);

        let json = serde_json::to_value(ServerEvent::GameOver {
            scores: vec![2, 2],
            winner: None,
        })
        .unwrap();
        assert_eq!(json["type"], "game-over");
        assert!(json["winner"].is_null());
    }
}
