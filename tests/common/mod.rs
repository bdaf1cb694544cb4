#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use chess_core::{parse_game, MoveTree};
use game_chunker::{assemble, BranchDescent, Chunk, ChunkerConfig, TokenCounter};

/// One token per whitespace-separated word, so budgets can be worked out by hand.
pub struct Words;

impl TokenCounter for Words {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Annotated game with nested variations, evaluations and two transpositions
/// (3. Nf3 ... 4. Nc3 and 5... O-O ... 7. Bh4 rejoin the main line).
pub const QGD: &str = r#"[Event "Queen's Gambit Course"]
[ChapterName "Declined"]
[Section "Main ideas"]

{The Queen's Gambit Declined is solid.} 1. d4 d5 2. c4 e6 {[%eval 0.3]} 3. Nc3 {The most natural square.} (3. Nf3 {Flexible.} Nf6 4. Nc3 {Transposes.} Be7 (4... c6 5. e3 {[%eval 0.2]}) 5. Bg5) 3... Nf6 4. Nf3 Be7 {[%eval 0.25]} 5. Bg5 h6! (5... O-O 6. e3 h6 7. Bh4 {Classical.} b6) 6. Bh4 O-O 7. e3 b6 {Tartakower setup.} 8. Be2 Bb7 9. Bxf6 Bxf6 10. cxd5 exd5 *
"#;

pub const QGD_COMMENTS: [&str; 6] = [
    "The Queen's Gambit Declined is solid.",
    "The most natural square.",
    "Flexible.",
    "Transposes.",
    "Classical.",
    "Tartakower setup.",
];

pub fn config(max: usize, min: usize, descent: BranchDescent) -> ChunkerConfig {
    ChunkerConfig {
        max_chunk_tokens: max,
        min_chunk_tokens: min,
        branch_descent: descent,
        ..Default::default()
    }
}

pub fn chunk_game(pgn: &str, file: &str, config: &ChunkerConfig) -> (MoveTree, Vec<Chunk>) {
    let tree = parse_game(pgn).unwrap();
    let chunks = assemble(&tree, file, 1, config, &Words).unwrap();
    (tree, chunks)
}

/// Movetext after the header of a chunk that was not merged.
pub fn body(chunk: &Chunk) -> &str {
    chunk.text.split_once("\n\n").map(|(_, b)| b).unwrap_or_default()
}

/// Every move of the game is covered by exactly one chunk.
pub fn assert_complete(tree: &MoveTree, chunks: &[Chunk]) {
    let mut seen = HashMap::new();
    for chunk in chunks {
        for scope in &chunk.scopes {
            for id in scope.nodes(tree) {
                *seen.entry(id).or_insert(0) += 1;
            }
        }
    }
    for id in tree.preorder(tree.root()) {
        let count = seen.get(&id).copied().unwrap_or(0);
        if tree.node(id).san.is_some() {
            assert_eq!(count, 1, "move {:?} covered {count} times", tree.node(id).san);
        } else {
            assert!(count <= 1);
        }
    }
}

pub fn assert_within_budget(chunks: &[Chunk], max: usize) {
    for chunk in chunks {
        assert!(
            chunk.token_count <= max || chunk.overflow,
            "{} has {} tokens",
            chunk.id,
            chunk.token_count
        );
    }
}

/// Every link is answered by a link back at the same position.
pub fn assert_links_symmetric(chunks: &[Chunk]) {
    let by_id: HashMap<&str, &Chunk> = chunks.iter().map(|c| (c.id.as_str(), c)).collect();
    for chunk in chunks {
        for link in &chunk.metadata.transpositions {
            for other in &link.linked_chunks {
                let target = by_id.get(other.as_str()).expect("link target in same game");
                assert!(
                    target.metadata.transpositions.iter().any(|back| {
                        back.position == link.position && back.linked_chunks.contains(&chunk.id)
                    }),
                    "{} -> {} not reciprocated",
                    chunk.id,
                    other
                );
            }
        }
    }
}

pub fn assert_unique_ids(chunks: &[Chunk]) {
    let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), chunks.len());
}
