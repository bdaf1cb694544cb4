//! Chunk records handed to the embedding pipeline.

use chess_core::{GameMetadata, MoveTree, NodeId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::scope::Scope;

/// Per-game identification shared by every chunk of that game.
#[derive(Debug, Clone)]
pub struct GameContext {
    pub source_file: String,
    /// 1-based position of the game inside its source file
    pub game_number: u32,
    pub metadata: GameMetadata,
}

impl GameContext {
    pub fn new(tree: &MoveTree, source_file: &str, game_number: u32) -> Self {
        Self {
            source_file: source_file.to_string(),
            game_number,
            metadata: GameMetadata::from_headers(tree.headers()),
        }
    }

    /// Human-readable reference used in logs and errors.
    pub fn game_ref(&self) -> String {
        format!("{}#{}", self.source_file, self.game_number)
    }

    /// Lowercased file stem with anything but ASCII alphanumerics turned into `-`.
    pub fn file_key(&self) -> String {
        let name = self.source_file.rsplit(['/', '\\']).next().unwrap_or_default();
        let stem = match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        };
        let key: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let key = key.trim_matches('-').to_string();
        if key.is_empty() { "game".to_string() } else { key }
    }

    /// `{file-key}_{game_number}_{hash}`; the hash covers file, game and branch path.
    pub fn chunk_id(&self, branch_path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_file.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.game_number.to_string().as_bytes());
        hasher.update([0x1f]);
        hasher.update(branch_path.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        format!("{}_{}_{}", self.file_key(), self.game_number, &digest[..16])
    }
}

/// Compact branch path: runs of main-line steps as `mN`, side variations as `vI`.
/// The root is `root`.
pub fn branch_path_key(path: &[usize]) -> String {
    if path.is_empty() {
        return "root".to_string();
    }
    let mut parts = Vec::new();
    let mut mainline_run = 0;
    for &index in path {
        if index == 0 {
            mainline_run += 1;
            continue;
        }
        if mainline_run > 0 {
            parts.push(format!("m{mainline_run}"));
            mainline_run = 0;
        }
        parts.push(format!("v{index}"));
    }
    if mainline_run > 0 {
        parts.push(format!("m{mainline_run}"));
    }
    parts.join(".")
}

/// Readable name for a chunk starting at `node`, metadata only.
pub fn branch_label(tree: &MoveTree, node: NodeId, ordinal: usize) -> String {
    let Some(parent) = tree.parent(node) else {
        return "Main line".to_string();
    };
    let Some(numbered) = tree.node(node).numbered_san() else {
        return format!("Variation {ordinal}");
    };

    if tree.is_branch_point(parent) {
        return if tree.child_index(node) == 0 {
            format!("Main line: {numbered}")
        } else {
            format!("Variation: {numbered}")
        };
    }

    // Continuation of a line: name it after the branch it belongs to.
    let mut current = parent;
    while let Some(up) = tree.parent(current) {
        if tree.is_branch_point(up) && tree.child_index(current) > 0 {
            return format!("{}, from {numbered}", branch_label(tree, current, ordinal));
        }
        current = up;
    }
    format!("Main line, from {numbered}")
}

/// First visit of a position inside a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionVisit {
    pub position: String,
    /// Game ply at which the position is reached
    pub ply: u32,
}

/// A position this chunk shares with other chunks of the same game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspositionLink {
    pub position: String,
    /// Ply at which this chunk first reaches `position`
    pub move_index: u32,
    pub linked_chunks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_file: String,
    pub game_number: u32,
    pub branch_path: String,
    /// Labels of every branch folded into this chunk, survivor first
    pub branch_labels: Vec<String>,
    pub positions: Vec<String>,
    pub transpositions: Vec<TranspositionLink>,
    #[serde(flatten)]
    pub game: GameMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub token_count: usize,
    /// A single move too large for the budget, emitted whole
    pub overflow: bool,
    pub metadata: ChunkMetadata,
    #[serde(skip)]
    pub scopes: Vec<Scope>,
    #[serde(skip)]
    pub visits: Vec<PositionVisit>,
}

impl Chunk {
    pub fn branch_label(&self) -> &str {
        self.metadata
            .branch_labels
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}
