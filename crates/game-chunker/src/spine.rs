use chess_core::{MoveTree, NodeId};

/// Moves played from the start of the game up to and including `node`.
/// The root carries no move and never appears.
pub fn spine(tree: &MoveTree, node: NodeId) -> Vec<NodeId> {
    let mut moves = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        if tree.node(id).san.is_some() {
            moves.push(id);
        }
        current = tree.parent(id);
    }
    moves.reverse();
    moves
}

/// History leading into a chunk that starts at `node`.
pub fn spine_before(tree: &MoveTree, node: NodeId) -> Vec<NodeId> {
    tree.parent(node)
        .map(|parent| spine(tree, parent))
        .unwrap_or_default()
}
