//! Branch-aware chunking of annotated games for embedding retrieval.
//!
//! A game is split at its variation branch points into token-bounded chunks, each
//! prefixed with a header that replays the moves leading to it. Undersized chunks are
//! merged and chunks reaching the same position are cross-linked.

pub mod assemble;
pub mod chunk;
pub mod collect;
pub mod compress;
pub mod config;
pub mod error;
pub mod header;
pub mod link;
pub mod merge;
pub mod render;
pub mod scope;
pub mod spine;
pub mod split;
pub mod tokens;

pub use assemble::{assemble, chunk_pgn};
pub use chunk::{Chunk, ChunkMetadata, GameContext, TranspositionLink};
pub use config::{BranchDescent, ChunkerConfig, EvalRetention};
pub use error::ChunkError;
pub use tokens::{HeuristicCounter, HfTokenCounter, TokenCounter};
