//! PGN-style movetext rendering of a scope.

use chess_core::{MoveTree, NodeId};

use crate::compress::EvalView;
use crate::scope::Scope;

struct Movetext<'a> {
    tree: &'a MoveTree,
    scope: &'a Scope,
    evals: &'a EvalView,
    out: String,
    /// Next black move must carry its own `N...` prefix.
    needs_number: bool,
}

impl Movetext<'_> {
    fn push(&mut self, token: &str) {
        if !self.out.is_empty() && !self.out.ends_with('(') && token != ")" {
            self.out.push(' ');
        }
        self.out.push_str(token);
    }

    fn write_node(&mut self, id: NodeId) {
        let tree = self.tree;
        let node = tree.node(id);
        if let Some(san) = node.annotated_san() {
            if node.is_white_move() {
                self.push(&format!("{}. {san}", node.move_number()));
            } else if self.needs_number {
                self.push(&format!("{}... {san}", node.move_number()));
            } else {
                self.push(&san);
            }
            self.needs_number = false;
        }

        let eval = node.eval.as_deref().filter(|_| self.evals.retains(id));
        let block = match (&node.comment, eval) {
            (Some(comment), Some(eval)) => Some(format!("{{{comment} [%eval {eval}]}}")),
            (Some(comment), None) => Some(format!("{{{comment}}}")),
            (None, Some(eval)) => Some(format!("{{[%eval {eval}]}}")),
            (None, None) => None,
        };
        if let Some(block) = block {
            self.push(&block);
            self.needs_number = true;
        }
    }

    /// Everything played after `from`, variations in parentheses.
    fn write_continuation(&mut self, from: NodeId) {
        let mut current = from;
        loop {
            let children = self.scope.children(self.tree, current);
            let Some((&main, sides)) = children.split_first() else {
                break;
            };
            self.write_node(main);
            for &side in sides {
                self.push("(");
                self.needs_number = true;
                self.write_node(side);
                self.write_continuation(side);
                self.push(")");
                self.needs_number = true;
            }
            current = main;
        }
    }
}

/// Render the moves, comments and retained evaluations of `scope`.
pub fn render_scope(tree: &MoveTree, scope: &Scope, evals: &EvalView) -> String {
    let mut text = Movetext {
        tree,
        scope,
        evals,
        out: String::new(),
        needs_number: true,
    };
    text.write_node(scope.root);
    text.write_continuation(scope.root);

    text.out
}
