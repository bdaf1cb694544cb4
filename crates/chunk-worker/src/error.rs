//! Worker error types

use game_chunker::ChunkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Invalid input pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chunking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
