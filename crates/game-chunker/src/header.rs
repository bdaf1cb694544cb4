//! Context preamble that makes a chunk readable on its own.

use chess_core::{MoveTree, NodeId};

use crate::chunk::GameContext;

/// Render identification lines followed by the moves played so far.
///
/// Two chunks starting from the same point get byte-identical headers.
pub fn build_header(ctx: &GameContext, tree: &MoveTree, spine: &[NodeId]) -> String {
    let meta = &ctx.metadata;
    let mut lines = Vec::new();

    if let Some(course) = &meta.course {
        lines.push(format!("Course: {course}"));
    }
    if let Some(chapter) = &meta.chapter {
        lines.push(format!("Chapter: {chapter}"));
    }
    if let Some(section) = &meta.section {
        lines.push(format!("Section: {section}"));
    }
    if !ctx.source_file.is_empty() {
        lines.push(format!("Source: {}", ctx.source_file));
    }
    lines.push(format!("Game: {}", ctx.game_number));

    let history = render_spine(tree, spine);
    if !history.is_empty() {
        lines.push(format!("Moves so far: {history}"));
    }

    lines.join("\n")
}

/// Bare SAN grouped by move number, e.g. `1. e4 e5 2. Nf3`.
pub fn render_spine(tree: &MoveTree, spine: &[NodeId]) -> String {
    let mut parts = Vec::with_capacity(spine.len());
    for (i, id) in spine.iter().enumerate() {
        let node = tree.node(*id);
        let Some(san) = &node.san else { continue };
        if node.is_white_move() {
            parts.push(format!("{}. {san}", node.move_number()));
        } else if i == 0 {
            parts.push(format!("{}... {san}", node.move_number()));
        } else {
            parts.push(san.clone());
        }
    }
    parts.join(" ")
}
