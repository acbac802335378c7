use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
