use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::game::board::Board;
use crate::game::engine::{Match, MatchStatus, Player};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of the durable mirror. Live state is never rolled back on these;
/// they are logged for operator visibility only.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Durable copy of one match, upserted after every accepted mutation and
/// read back when a rejoin rehydrates a room that has no live instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub players: Vec<Player>,
    pub board: Board,
    #[serde(rename = "currentPlayer")]
    pub current_player: usize,
    pub status: MatchStatus,
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

impl MatchSnapshot {
    pub fn of(game: &Match) -> Self {
        MatchSnapshot {
            room_id: game.room_id.clone(),
            players: game.players.clone(),
            board: game.board.clone(),
            current_player: game.current_player,
            status: game.status,
            updated_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    pub fn into_match(self) -> Match {
        Match {
            room_id: self.room_id,
            players: self.players,
            board: self.board,
            current_player: self.current_player,
            status: self.status,
            last_activity: SystemTime::now(),
        }
    }
}

/// Abstraction over the document store mirroring live matches.
pub trait GameStore: Send + Sync {
    fn upsert_match(&self, snapshot: MatchSnapshot) -> BoxFuture<'static, StorageResult<()>>;
    fn fetch_match(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<MatchSnapshot>>>;
}

fn match_key(room_id: &str) -> String {
    format!("sos:match:{room_id}")
}

/// Redis-backed store: one JSON blob per room.
#[derive(Clone)]
pub struct RedisStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        info!("Connected to redis at {}", url);
        Ok(RedisStore { manager })
    }
}

impl GameStore for RedisStore {
    fn upsert_match(&self, snapshot: MatchSnapshot) -> BoxFuture<'static, StorageResult<()>> {
        let mut conn = self.manager.clone();
        async move {
            let payload = serde_json::to_string(&snapshot)?;
            let _: () = conn.set(match_key(&snapshot.room_id), payload).await?;
            Ok(())
        }
        .boxed()
    }

    fn fetch_match(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<MatchSnapshot>>> {
        let mut conn = self.manager.clone();
        let key = match_key(room_id);
        async move {
            let payload: Option<String> = conn.get(key).await?;
            match payload {
                Some(json) => Ok(Some(serde_json::from_str(&json)?)),
                None => Ok(None),
            }
        }
        .boxed()
    }
}

/// In-memory store used in tests and as the degraded-mode fallback when no
/// redis is configured or reachable.
#[derive(Default)]
pub struct MemoryStore {
    matches: Arc<RwLock<HashMap<String, MatchSnapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryStore {
    fn upsert_match(&self, snapshot: MatchSnapshot) -> BoxFuture<'static, StorageResult<()>> {
        let matches = Arc::clone(&self.matches);
        async move {
            matches
                .write()
                .await
                .insert(snapshot.room_id.clone(), snapshot);
            Ok(())
        }
        .boxed()
    }

    fn fetch_match(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<MatchSnapshot>>> {
        let matches = Arc::clone(&self.matches);
        let room_id = room_id.to_string();
        async move { Ok(matches.read().await.get(&room_id).cloned()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_a_snapshot() {
        let store = MemoryStore::new();
        let game = Match::new("ROOM42".into(), "alice".into(), "Alice".into(), 8);
        store.upsert_match(MatchSnapshot::of(&game)).await.unwrap();

        let found = store.fetch_match("ROOM42").await.unwrap().unwrap();
        assert_eq!(found.room_id, "ROOM42");
        assert_eq!(found.players.len(), 1);
        assert_eq!(found.status, MatchStatus::Waiting);
        assert!(store.fetch_match("NOPE").await.unwrap().is_none());
    }

    #[test]
    fn snapshot_serializes_with_wire_field_names() {
        let game = Match::new("ROOM42".into(), "alice".into(), "Alice".into(), 3);
        let json = serde_json::to_value(MatchSnapshot::of(&game)).unwrap();
        assert_eq!(json["roomId"], "ROOM42");
        assert_eq!(json["currentPlayer"], 0);
        assert_eq!(json["status"], "waiting");
        assert!(json["updatedAt"].is_u64());
        assert_eq!(json["players"][0]["userId"], "alice");
    }
}
