//! End-to-end chunking of a single game.

use chess_core::{parse_game, MoveTree};
use tracing::{info, warn};

use crate::chunk::{Chunk, GameContext};
use crate::collect::collect_all;
use crate::config::ChunkerConfig;
use crate::error::ChunkError;
use crate::link::link;
use crate::merge::merge;
use crate::split::Splitter;
use crate::tokens::TokenCounter;

/// Split, merge, collect positions and link transpositions for one parsed game.
pub fn assemble(
    tree: &MoveTree,
    source_file: &str,
    game_number: u32,
    config: &ChunkerConfig,
    counter: &dyn TokenCounter,
) -> Result<Vec<Chunk>, ChunkError> {
    config.validate()?;
    let ctx = GameContext::new(tree, source_file, game_number);
    let game = ctx.game_ref();

    let split = Splitter::new(tree, &ctx, config, counter).split(tree.root());
    let emitted = split.len();

    let mut chunks = merge(
        split,
        config.min_chunk_tokens,
        config.max_chunk_tokens,
        counter,
    );
    check_budget(&chunks, config.max_chunk_tokens, &game)?;

    collect_all(tree, &mut chunks);
    link(&mut chunks, &game)?;

    let overflow = chunks.iter().filter(|c| c.overflow).count();
    if overflow > 0 {
        warn!(game = %game, overflow, "Game has chunks over the token budget");
    }
    info!(
        game = %game,
        moves = tree.len() - 1,
        emitted,
        chunks = chunks.len(),
        linked = chunks.iter().filter(|c| !c.metadata.transpositions.is_empty()).count(),
        "Chunked game"
    );
    Ok(chunks)
}

/// Parse `pgn` and chunk the first game in it.
pub fn chunk_pgn(
    pgn: &str,
    source_file: &str,
    game_number: u32,
    config: &ChunkerConfig,
    counter: &dyn TokenCounter,
) -> Result<Vec<Chunk>, ChunkError> {
    let tree = parse_game(pgn).map_err(|source| ChunkError::Parse {
        game: format!("{source_file}#{game_number}"),
        source,
    })?;
    assemble(&tree, source_file, game_number, config, counter)
}

fn check_budget(chunks: &[Chunk], max_tokens: usize, game: &str) -> Result<(), ChunkError> {
    for chunk in chunks {
        if chunk.token_count > max_tokens && !chunk.overflow {
            let invariant = if chunk.scopes.len() > 1 {
                "merged chunk within budget"
            } else {
                "chunk within budget"
            };
            return Err(ChunkError::Invariant {
                invariant,
                game: game.to_string(),
                branch: chunk.metadata.branch_path.clone(),
                detail: format!("{} tokens, max {max_tokens}", chunk.token_count),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Words;

    impl TokenCounter for Words {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    #[test]
    fn test_short_game_single_chunk() {
        let config = ChunkerConfig::default();
        let chunks = chunk_pgn(
            "[Event \"Italian Repertoire\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bc4 *",
            "italian.pgn",
            1,
            &config,
            &Words,
        )
        .unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].metadata.transpositions.is_empty());
        assert_eq!(chunks[0].metadata.positions.len(), 6);
        assert!(chunks[0].text.starts_with("Course: Italian Repertoire\nSource: italian.pgn\nGame: 1"));
    }

    #[test]
    fn test_parse_failure_names_game() {
        let err = chunk_pgn("1. e4 e5 2. Ke3 *", "bad.pgn", 4, &ChunkerConfig::default(), &Words)
            .unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("bad.pgn#4"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChunkerConfig {
            max_chunk_tokens: 10,
            min_chunk_tokens: 20,
            ..Default::default()
        };
        let err = chunk_pgn("1. e4 *", "a.pgn", 1, &config, &Words).unwrap_err();
        assert!(matches!(err, ChunkError::Config(_)));
    }

    #[test]
    fn test_budget_check_flags_unmarked_chunk() {
        let chunk = Chunk {
            id: "x".to_string(),
            text: String::new(),
            token_count: 50,
            overflow: false,
            metadata: Default::default(),
            scopes: Vec::new(),
            visits: Vec::new(),
        };
        let err = check_budget(&[chunk], 10, "g#1").unwrap_err();
        assert!(err.to_string().contains("chunk within budget"));
    }
}
