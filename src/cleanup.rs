use crate::app_state::AppState;

use std::{sync::Arc, time::Duration};
use tracing::info;

/// Sweeps live matches whose clients vanished without a Close frame. Their
/// persisted snapshots are left behind.
pub async fn cleanup_inactive_matches(app_state: Arc<AppState>) {
    let timeout = Duration::from_secs(1800); // 30 minutes

    loop {
        tokio::time::sleep(Duration::from_secs(600)).await; // Run every 10 min

        let swept = app_state.registry.sweep_idle(timeout).await;
        if swept > 0 {
            info!(
                "Cleaned up {} inactive matches. Remaining: {}",
                swept,
                app_state.registry.live_count().await
            );
        }
    }
}
