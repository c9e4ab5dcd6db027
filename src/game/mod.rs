pub mod board;
pub mod detector;
pub mod engine;
pub mod handlers;
pub mod message;
