//! Chunker error types

use chess_core::PgnError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Malformed game {game}: {source}")]
    Parse {
        game: String,
        #[source]
        source: PgnError,
    },

    #[error("Invariant '{invariant}' violated in {game} at branch {branch}: {detail}")]
    Invariant {
        invariant: &'static str,
        game: String,
        branch: String,
        detail: String,
    },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

impl ChunkError {
    /// True for errors caused by bad input rather than a defect in the chunker.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ChunkError::Parse { .. })
    }
}
