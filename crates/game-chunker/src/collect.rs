//! Positions reached inside each chunk.

use std::collections::HashSet;

use chess_core::MoveTree;

use crate::chunk::{Chunk, PositionVisit};

/// First visit of every position inside `chunk`'s scopes, in reading order.
pub fn collect(tree: &MoveTree, chunk: &Chunk) -> Vec<PositionVisit> {
    let mut seen = HashSet::new();
    let mut visits = Vec::new();

    for scope in &chunk.scopes {
        for id in scope.nodes(tree) {
            let node = tree.node(id);
            if seen.insert(node.position.as_str()) {
                visits.push(PositionVisit {
                    position: node.position.clone(),
                    ply: node.ply,
                });
            }
        }
    }
    visits
}

/// Fill `visits` and the serialized position list of every chunk.
pub fn collect_all(tree: &MoveTree, chunks: &mut [Chunk]) {
    for chunk in chunks.iter_mut() {
        chunk.visits = collect(tree, chunk);
        chunk.metadata.positions = chunk.visits.iter().map(|v| v.position.clone()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkMetadata;
    use crate::scope::Scope;
    use chess_core::parse_game;

    fn chunk_over(scopes: Vec<Scope>) -> Chunk {
        Chunk {
            id: "c".to_string(),
            text: String::new(),
            token_count: 0,
            overflow: false,
            metadata: ChunkMetadata::default(),
            scopes,
            visits: Vec::new(),
        }
    }

    #[test]
    fn test_repeated_position_recorded_once() {
        // Knights out and back: the start position is reached again at ply 4.
        let tree = parse_game("1. Nf3 Nf6 2. Ng1 Ng8 3. e4 *").unwrap();
        let chunk = chunk_over(vec![Scope::subtree(tree.root())]);
        let visits = collect(&tree, &chunk);
        assert_eq!(visits.len(), tree.len() - 1);
        assert_eq!(visits[0].ply, 0);
        assert!(visits.iter().all(|v| v.ply != 4));
    }

    #[test]
    fn test_leaf_scope() {
        let tree = parse_game("1. e4 e5 *").unwrap();
        let last = tree.mainline()[1];
        let chunk = chunk_over(vec![Scope::subtree(last)]);
        let visits = collect(&tree, &chunk);
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].ply, 2);
        assert_eq!(visits[0].position, tree.node(last).position);
    }

    #[test]
    fn test_merged_scopes_in_order() {
        let tree = parse_game("1. e4 e5 (1... c5) 2. Nf3 *").unwrap();
        let e4 = tree.mainline()[0];
        let c5 = tree.children(e4)[1];
        let mut chunks = vec![chunk_over(vec![
            Scope::segment(&tree, tree.root(), e4),
            Scope::subtree(c5),
        ])];
        collect_all(&tree, &mut chunks);
        let plies: Vec<u32> = chunks[0].visits.iter().map(|v| v.ply).collect();
        assert_eq!(plies, vec![0, 1, 2]);
        assert_eq!(chunks[0].metadata.positions.len(), 3);
        assert_eq!(chunks[0].metadata.positions[2], tree.node(c5).position);
    }
}
