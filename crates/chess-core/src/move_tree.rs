//! Arena-backed move tree: a main line with nested variations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Handle to a node inside a [`MoveTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A position reached after a move (or the start position, for the root).
#[derive(Debug, Clone)]
pub struct MoveNode {
    pub parent: Option<NodeId>,
    /// First child continues the main line, the rest are side variations.
    pub children: Vec<NodeId>,
    /// SAN of the move leading here (`None` on the root)
    pub san: Option<String>,
    pub nags: Vec<u8>,
    pub comment: Option<String>,
    /// Raw engine evaluation lifted from a `[%eval ...]` command
    pub eval: Option<String>,
    /// Half-moves played to reach this node, counted from move 1
    pub ply: u32,
    /// Canonical position string (see [`crate::position::canonical_position`])
    pub position: String,
}

impl MoveNode {
    /// Full-move number of the move that produced this node.
    pub fn move_number(&self) -> u32 {
        self.ply.saturating_sub(1) / 2 + 1
    }

    /// True when the move leading here was played by white.
    pub fn is_white_move(&self) -> bool {
        self.ply % 2 == 1
    }

    /// SAN followed by any move-quality glyphs, e.g. `Nf3!?`.
    pub fn annotated_san(&self) -> Option<String> {
        let san = self.san.as_ref()?;
        let mut out = san.clone();
        for nag in &self.nags {
            match nag_glyph(*nag) {
                Some(glyph) => out.push_str(glyph),
                None => {
                    out.push_str(" $");
                    out.push_str(&nag.to_string());
                }
            }
        }
        Some(out)
    }

    /// Move number prefix plus SAN, e.g. `7... Nf6`.
    pub fn numbered_san(&self) -> Option<String> {
        let san = self.san.as_ref()?;
        let dots = if self.is_white_move() { "." } else { "..." };
        Some(format!("{}{} {}", self.move_number(), dots, san))
    }
}

fn nag_glyph(nag: u8) -> Option<&'static str> {
    match nag {
        1 => Some("!"),
        2 => Some("?"),
        3 => Some("!!"),
        4 => Some("??"),
        5 => Some("!?"),
        6 => Some("?!"),
        _ => None,
    }
}

/// One parsed game. Read-only once built.
#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<MoveNode>,
    headers: BTreeMap<String, String>,
}

impl MoveTree {
    pub(crate) fn new(root_position: String, root_ply: u32) -> Self {
        Self {
            nodes: vec![MoveNode {
                parent: None,
                children: Vec::new(),
                san: None,
                nags: Vec::new(),
                comment: None,
                eval: None,
                ply: root_ply,
                position: root_position,
            }],
            headers: BTreeMap::new(),
        }
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, san: String, position: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        let ply = self.nodes[parent.0].ply + 1;
        self.nodes.push(MoveNode {
            parent: Some(parent),
            children: Vec::new(),
            san: Some(san),
            nags: Vec::new(),
            comment: None,
            eval: None,
            ply,
            position,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut MoveNode {
        &mut self.nodes[id.0]
    }

    pub(crate) fn set_headers(&mut self, headers: BTreeMap<String, String>) {
        self.headers = headers;
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &MoveNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// A node with more than one continuation.
    pub fn is_branch_point(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.len() > 1
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    /// Position of `id` among its siblings (0 = main continuation).
    pub fn child_index(&self, id: NodeId) -> usize {
        self.parent(id)
            .and_then(|p| self.children(p).iter().position(|c| *c == id))
            .unwrap_or(0)
    }

    /// Child indices from the root down to `id`.
    pub fn branch_path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.child_index(current));
            current = parent;
        }
        path.reverse();
        path
    }

    /// Nodes of the subtree rooted at `id` in PGN order (main line before variations).
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Main line from the root, root excluded.
    pub fn mainline(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.root();
        while let Some(&next) = self.children(current).first() {
            out.push(next);
            current = next;
        }
        out
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}
