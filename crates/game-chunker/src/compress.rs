//! Evaluation thinning for dense engine-annotated lines.
//!
//! This is a rendering-time view: the move tree is left untouched, the view only
//! records which nodes may print their evaluation.

use std::collections::BTreeSet;

use chess_core::{MoveTree, NodeId};

use crate::config::EvalRetention;
use crate::scope::Scope;

/// Nodes whose evaluation survives compression.
#[derive(Debug, Clone, Default)]
pub struct EvalView {
    retained: BTreeSet<NodeId>,
}

impl EvalView {
    pub fn retains(&self, node: NodeId) -> bool {
        self.retained.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Decide, per node in `scope`, whether its evaluation is printed.
///
/// Under the default policy an eval is kept on branch points, on the last node of a
/// line and next to prose. Moves and comments are never affected.
pub fn compress(tree: &MoveTree, scope: &Scope, policy: EvalRetention) -> EvalView {
    let retained = scope
        .nodes(tree)
        .into_iter()
        .filter(|id| tree.node(*id).eval.is_some())
        .filter(|id| match policy {
            EvalRetention::RetainAll => true,
            EvalRetention::RetainNone => false,
            EvalRetention::RetainAtBranchesAndComments => {
                tree.is_branch_point(*id)
                    || scope.is_line_end(tree, *id)
                    || tree.node(*id).comment.is_some()
            }
        })
        .collect();
    EvalView { retained }
}
