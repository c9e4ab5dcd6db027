use std::sync::Arc;
use tokio::sync::broadcast;

use crate::game::message::ServerEvent;
use crate::registry::SessionRegistry;
use crate::store::GameStore;

/// Shared state behind every connection: the session registry plus the
/// process-wide broadcast channel carrying `(room_id, event)` pairs.
pub struct AppState {
    pub registry: SessionRegistry,
    pub tx: broadcast::Sender<(String, ServerEvent)>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn GameStore>,
        board_size: usize,
        tx: broadcast::Sender<(String, ServerEvent)>,
    ) -> Self {
        AppState {
            registry: SessionRegistry::new(store, board_size),
            tx,
        }
    }

    /// Fans an event out to every connection subscribed to `room_id`. A send
    /// error only means no receiver is currently listening.
    pub fn broadcast(&self, room_id: &str, event: ServerEvent) {
        let _ = self.tx.send((room_id.to_string(), event));
    }
}
