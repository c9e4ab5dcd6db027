use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::GameError;
use crate::game::engine::{Match, MatchStatus};
use crate::store::{GameStore, MatchSnapshot};

/// Handle to one live match. Each room has its own lock so actions on
/// unrelated rooms never serialize against each other.
pub type MatchHandle = Arc<Mutex<Match>>;

/// Owns the room id → live match map. The only shared mutable state in the
/// process; everything else reaches matches through the handles it gives out.
pub struct SessionRegistry {
    rooms: RwLock<HashMap<String, MatchHandle>>,
    store: Arc<dyn GameStore>,
    board_size: usize,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn GameStore>, board_size: usize) -> Self {
        SessionRegistry {
            rooms: RwLock::new(HashMap::new()),
            store,
            board_size,
        }
    }

    /// Creates a match under a fresh room code and returns both.
    pub async fn create_room(&self, user_id: String, name: String) -> (String, MatchHandle) {
        let mut rooms = self.rooms.write().await;
        let room_id = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };
        let game = Match::new(room_id.clone(), user_id, name, self.board_size);
        let handle = Arc::new(Mutex::new(game));
        rooms.insert(room_id.clone(), Arc::clone(&handle));
        info!("Created room {}", room_id);
        (room_id, handle)
    }

    /// Returns the live match. Rooms torn down on disconnect are not found
    /// here; only a rejoin may resurrect them.
    pub async fn get(&self, room_id: &str) -> Result<MatchHandle, GameError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(Arc::clone)
            .ok_or(GameError::RoomNotFound)
    }

    /// Returns the live match, or rehydrates it from the persisted snapshot.
    /// Used by the join path only; concluded matches are not resumable.
    pub async fn get_or_recover(&self, room_id: &str) -> Result<MatchHandle, GameError> {
        if let Ok(handle) = self.get(room_id).await {
            return Ok(handle);
        }

        let snapshot = match self.store.fetch_match(room_id).await {
            Ok(found) => found,
            Err(err) => {
                error!("Failed to read snapshot for room {}: {}", room_id, err);
                None
            }
        };
        let snapshot = snapshot.ok_or(GameError::RoomNotFound)?;
        if snapshot.status == MatchStatus::Finished {
            return Err(GameError::RoomNotFound);
        }

        let mut rooms = self.rooms.write().await;
        // A concurrent recovery may have won the race while we read the store.
        let handle = rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!("Rehydrated room {} from its persisted snapshot", room_id);
                Arc::new(Mutex::new(snapshot.into_match()))
            });
        Ok(Arc::clone(handle))
    }

    /// Drops the live instance. The persisted snapshot is left behind.
    pub async fn remove(&self, room_id: &str) -> Option<MatchHandle> {
        let removed = self.rooms.write().await.remove(room_id);
        if removed.is_some() {
            info!("Removed live room {}", room_id);
        }
        removed
    }

    /// Upserts the durable mirror of `game`. Returns whether the write made
    /// it to the store; a miss leaves live state ahead of the durable copy.
    pub async fn mirror(&self, game: &Match) -> bool {
        match self.store.upsert_match(MatchSnapshot::of(game)).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Applied but not persisted: mirror write for room {} failed: {}",
                    game.room_id, err
                );
                false
            }
        }
    }

    /// Drops live matches idle longer than `timeout`. Their snapshots stay.
    pub async fn sweep_idle(&self, timeout: Duration) -> usize {
        let mut rooms = self.rooms.write().await;
        let mut stale = Vec::new();
        for (room_id, handle) in rooms.iter() {
            let game = handle.lock().await;
            if game.last_activity.elapsed().unwrap_or(timeout) >= timeout {
                stale.push(room_id.clone());
            }
        }
        for room_id in &stale {
            rooms.remove(room_id);
        }
        stale.len()
    }

    pub async fn live_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

/// Short uppercase room code; the caller regenerates on collision.
fn generate_room_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}
