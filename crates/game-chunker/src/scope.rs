//! The slice of the move tree a chunk covers.

use std::collections::BTreeSet;

use chess_core::{MoveTree, NodeId};

/// A subtree root plus the child subtrees cut away from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub root: NodeId,
    pub cut: BTreeSet<NodeId>,
}

impl Scope {
    /// The whole subtree below `root`.
    pub fn subtree(root: NodeId) -> Self {
        Self {
            root,
            cut: BTreeSet::new(),
        }
    }

    /// The straight line `first ..= last`, everything after `last` cut away.
    pub fn segment(tree: &MoveTree, first: NodeId, last: NodeId) -> Self {
        Self::subtree(first).narrow(tree, first, last)
    }

    /// The straight line `first ..= last` inside this scope.
    pub fn narrow(&self, tree: &MoveTree, first: NodeId, last: NodeId) -> Self {
        let mut cut = self.cut.clone();
        cut.extend(tree.children(last).iter().copied());
        Self { root: first, cut }
    }

    /// Children of `node` that belong to this scope, main line first.
    pub fn children(&self, tree: &MoveTree, node: NodeId) -> Vec<NodeId> {
        tree.children(node)
            .iter()
            .copied()
            .filter(|c| !self.cut.contains(c))
            .collect()
    }

    /// True when no line continues past `node` inside this scope.
    pub fn is_line_end(&self, tree: &MoveTree, node: NodeId) -> bool {
        tree.children(node).iter().all(|c| self.cut.contains(c))
    }

    /// Member nodes in PGN order.
    pub fn nodes(&self, tree: &MoveTree) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(tree, next).into_iter().rev());
        }
        out
    }
}
