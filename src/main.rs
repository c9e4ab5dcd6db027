use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sos_server::app_state::AppState;
use sos_server::cleanup::cleanup_inactive_matches;
use sos_server::config::Config;
use sos_server::store::{GameStore, MemoryStore, RedisStore};
use sos_server::ws_socket::ws_handler;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store: Arc<dyn GameStore> = match &config.redis_url {
        Some(url) => match RedisStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(
                    "Could not reach redis at {} ({}); falling back to the in-memory store",
                    url, err
                );
                Arc::new(MemoryStore::new())
            }
        },
        None => {
            info!("REDIS_URL not set; match snapshots stay in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let (tx, _) = broadcast::channel(500);
    let app_state = Arc::new(AppState::new(store, config.board_size, tx));

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::clone(&app_state));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(
        "Server is running on {} ({}x{} boards)",
        addr, config.board_size, config.board_size
    );

    tokio::spawn(cleanup_inactive_matches(Arc::clone(&app_state)));
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server error: {}", e);
    }
}
