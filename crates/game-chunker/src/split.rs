//! Branch-aware splitting of a move tree into token-bounded chunks.

use std::collections::{HashMap, HashSet};

use chess_core::{MoveTree, NodeId};
use tracing::{debug, warn};

use crate::chunk::{branch_label, branch_path_key, Chunk, ChunkMetadata, GameContext};
use crate::compress::compress;
use crate::config::{BranchDescent, ChunkerConfig};
use crate::header::build_header;
use crate::render::render_scope;
use crate::scope::Scope;
use crate::spine::spine_before;
use crate::tokens::TokenCounter;

pub struct Splitter<'a> {
    tree: &'a MoveTree,
    ctx: &'a GameContext,
    config: &'a ChunkerConfig,
    counter: &'a dyn TokenCounter,
}

impl<'a> Splitter<'a> {
    pub fn new(
        tree: &'a MoveTree,
        ctx: &'a GameContext,
        config: &'a ChunkerConfig,
        counter: &'a dyn TokenCounter,
    ) -> Self {
        Self {
            tree,
            ctx,
            config,
            counter,
        }
    }

    /// Partition the subtree below `node` into chunks, in play order.
    /// Only finished leaves of the recursion are returned.
    pub fn split(&self, node: NodeId) -> Vec<Chunk> {
        let mut out = Vec::new();
        self.split_into(node, &mut out);
        out
    }

    fn budget(&self) -> usize {
        self.config.max_chunk_tokens
    }

    fn split_into(&self, node: NodeId, out: &mut Vec<Chunk>) {
        let whole = self.emit(Scope::subtree(node), out.len() + 1);
        if whole.token_count <= self.budget() {
            out.push(whole);
            return;
        }

        debug!(
            game = %self.ctx.game_ref(),
            branch = %whole.metadata.branch_path,
            tokens = whole.token_count,
            "Subtree over budget, splitting"
        );
        match self.config.branch_descent {
            BranchDescent::Shallowest => self.split_at_nearest_branch(node, out),
            BranchDescent::Deepest => self.split_deepest_first(node, out),
        }
    }

    /// Emit the run from `node` down to its first branch point, then recurse
    /// into every continuation of that branch point.
    fn split_at_nearest_branch(&self, node: NodeId, out: &mut Vec<Chunk>) {
        let mut run = vec![node];
        let mut tail = node;
        while let [only] = self.tree.children(tail) {
            tail = *only;
            run.push(tail);
        }

        self.split_linear(&run, &Scope::subtree(node), out);
        for &child in self.tree.children(tail) {
            self.split_into(child, out);
        }
    }

    /// Keep the subtree whole and detach the side variations of the deepest
    /// branch point, repeatedly, until the remainder fits.
    fn split_deepest_first(&self, node: NodeId, out: &mut Vec<Chunk>) {
        let mut scope = Scope::subtree(node);
        let mut detached = Vec::new();

        loop {
            let Some(branch) = self.deepest_open_branch(&scope) else {
                let line = self.scope_line(&scope);
                self.split_linear(&line, &scope, out);
                break;
            };
            let sides: Vec<NodeId> = scope
                .children(self.tree, branch)
                .into_iter()
                .skip(1)
                .collect();
            for side in sides {
                scope.cut.insert(side);
                detached.push(side);
            }

            let remainder = self.emit(scope.clone(), out.len() + 1);
            if remainder.token_count <= self.budget() {
                out.push(remainder);
                break;
            }
        }

        let order: HashMap<NodeId, usize> = self
            .tree
            .preorder(node)
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        detached.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        // A side nested inside another detached side is reached again by that side's split.
        let outer: HashSet<NodeId> = detached.iter().copied().collect();
        detached.retain(|&side| !self.has_ancestor_in(side, &outer));
        for side in detached {
            self.split_into(side, out);
        }
    }

    fn has_ancestor_in(&self, node: NodeId, set: &HashSet<NodeId>) -> bool {
        let mut up = self.tree.parent(node);
        while let Some(id) = up {
            if set.contains(&id) {
                return true;
            }
            up = self.tree.parent(id);
        }
        false
    }

    fn deepest_open_branch(&self, scope: &Scope) -> Option<NodeId> {
        scope
            .nodes(self.tree)
            .into_iter()
            .enumerate()
            .filter(|(_, id)| scope.children(self.tree, *id).len() > 1)
            .max_by_key(|(i, id)| (self.tree.node(*id).ply, *i))
            .map(|(_, id)| id)
    }

    fn scope_line(&self, scope: &Scope) -> Vec<NodeId> {
        let mut line = vec![scope.root];
        let mut current = scope.root;
        while let Some(&next) = scope.children(self.tree, current).first() {
            line.push(next);
            current = next;
        }
        line
    }

    /// Pack consecutive moves of a straight line of `within` into as few chunks
    /// as fit. A single move that is too large alone is emitted as an overflow chunk.
    fn split_linear(&self, run: &[NodeId], within: &Scope, out: &mut Vec<Chunk>) {
        let mut start = 0;
        while start < run.len() {
            let ordinal = out.len() + 1;
            let mut best = self.emit(within.narrow(self.tree, run[start], run[start]), ordinal);
            let mut end = start;

            if !best.overflow {
                // Largest end whose segment still fits.
                let (mut lo, mut hi) = (start, run.len() - 1);
                while lo < hi {
                    let mid = (lo + hi).div_ceil(2);
                    let candidate = self.emit(within.narrow(self.tree, run[start], run[mid]), ordinal);
                    if candidate.token_count <= self.budget() {
                        lo = mid;
                        best = candidate;
                    } else {
                        hi = mid - 1;
                    }
                }
                end = lo;
            } else {
                warn!(
                    game = %self.ctx.game_ref(),
                    branch = %best.metadata.branch_path,
                    tokens = best.token_count,
                    max = self.budget(),
                    "Single move exceeds token budget, emitting overflow chunk"
                );
            }

            // A bare game root (no move, no prose) carries nothing worth a chunk.
            if end > start || !self.is_bare(run[start]) {
                out.push(best);
            }
            start = end + 1;
        }
    }

    fn is_bare(&self, node: NodeId) -> bool {
        let node = self.tree.node(node);
        node.san.is_none() && node.comment.is_none() && node.eval.is_none()
    }

    /// Render `scope` with its context header and measure it.
    pub(crate) fn emit(&self, scope: Scope, ordinal: usize) -> Chunk {
        let tree = self.tree;
        let spine = spine_before(tree, scope.root);
        let header = build_header(self.ctx, tree, &spine);
        let evals = compress(tree, &scope, self.config.eval_retention);
        let body = render_scope(tree, &scope, &evals);
        let text = if body.is_empty() {
            header
        } else {
            format!("{header}\n\n{body}")
        };

        let token_count = self.counter.count_tokens(&text);
        let branch_path = branch_path_key(&tree.branch_path(scope.root));

        Chunk {
            id: self.ctx.chunk_id(&branch_path),
            text,
            token_count,
            overflow: token_count > self.budget(),
            metadata: ChunkMetadata {
                source_file: self.ctx.source_file.clone(),
                game_number: self.ctx.game_number,
                branch_path,
                branch_labels: vec![branch_label(tree, scope.root, ordinal)],
                positions: Vec::new(),
                transpositions: Vec::new(),
                game: self.ctx.metadata.clone(),
            },
            scopes: vec![scope],
            visits: Vec::new(),
        }
    }
}
