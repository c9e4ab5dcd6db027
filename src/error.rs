use thiserror::Error;

/// Rule and coordination failures surfaced to the originating client as a
/// generic `error` event. Never broadcast, never fatal.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Room is full")]
    RoomFull,
    #[error("It's not your turn")]
    NotYourTurn,
    #[error("Cell already taken")]
    CellOccupied,
    #[error("Coordinates out of bounds: ({row}, {col})")]
    OutOfBounds { row: usize, col: usize },
    #[error("Game is over")]
    GameOver,
}
