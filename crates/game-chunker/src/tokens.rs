//! Token counting against the target embedding model.

use std::path::Path;

use tokenizers::Tokenizer;
use tracing::warn;

use crate::error::ChunkError;

/// Anything that can tell how many tokens a rendered chunk costs.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Rough estimate of ~4 characters per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// Wrapper around a HuggingFace `tokenizer.json`.
pub struct HfTokenCounter {
    inner: Tokenizer,
}

impl HfTokenCounter {
    pub fn from_file(path: &Path) -> Result<Self, ChunkError> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| ChunkError::Tokenizer(format!("{}: {e}", path.display())))?;
        Ok(Self { inner })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        match self.inner.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                warn!(error = %e, "Tokenizer failed, using heuristic estimate");
                HeuristicCounter.count_tokens(text)
            }
        }
    }
}
