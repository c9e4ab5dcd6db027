//! Realtime two-player SOS server: a session registry of live matches, a
//! pure rules core, a WebSocket transport and a best-effort redis mirror.

pub mod app_state;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod game;
pub mod registry;
pub mod store;
pub mod ws_socket;
