//! PGN parsing into a [`MoveTree`], variations and annotations included.

use std::collections::BTreeMap;
use std::io::Read;
use std::ops::ControlFlow;
use std::sync::LazyLock;

use pgn_reader::{Nag, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use shakmaty::{fen::Fen, CastlingMode, Chess, Position};
use thiserror::Error;

use crate::move_tree::{MoveTree, NodeId};
use crate::position::canonical_position;

static EVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%eval\s+([^\]\s]+)[^\]]*\]").expect("valid eval regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("no game found in input")]
    Empty,

    #[error("invalid FEN tag: {0}")]
    InvalidFen(String),

    #[error("illegal move {san} at ply {ply}")]
    IllegalMove { san: String, ply: u32 },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Parse the first game in `pgn`.
pub fn parse_game(pgn: &str) -> Result<MoveTree, PgnError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let mut builder = TreeBuilder;
    match reader.read_game(&mut builder) {
        Ok(Some(result)) => result,
        Ok(None) => Err(PgnError::Empty),
        Err(e) => Err(PgnError::Io(e.to_string())),
    }
}

/// Parse every game in a PGN stream. One result per game, in file order.
pub fn read_games<R: Read>(source: R) -> std::io::Result<Vec<Result<MoveTree, PgnError>>> {
    let mut reader = Reader::new(source);
    let mut builder = TreeBuilder;
    let mut games = Vec::new();
    while let Some(result) = reader.read_game(&mut builder)? {
        games.push(result);
    }
    Ok(games)
}

/// Split a raw comment into prose and an optional `[%eval]` value.
pub fn split_eval(raw: &str) -> (Option<String>, Option<String>) {
    let eval = EVAL_RE.captures(raw).map(|cap| cap[1].to_string());
    let prose = EVAL_RE.replace_all(raw, "");
    let prose = prose.split_whitespace().collect::<Vec<_>>().join(" ");
    let prose = if prose.is_empty() { None } else { Some(prose) };
    (prose, eval)
}

fn append_comment(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(text);
        }
        None => *slot = Some(text.to_string()),
    }
}

/// Tags collected during header parsing.
#[derive(Default)]
struct GameTags {
    headers: BTreeMap<String, String>,
}

/// State during movetext parsing.
struct TreeState {
    tree: MoveTree,
    /// Board after each node, indexed like the arena
    boards: Vec<Chess>,
    current: NodeId,
    /// Nodes to return to when a variation closes
    stack: Vec<NodeId>,
    /// Comments seen after `(` but before the variation's first move
    pending: Vec<String>,
    in_fresh_variation: bool,
}

impl TreeState {
    fn attach_comment(&mut self, text: &str) {
        let (prose, eval) = split_eval(text);
        let node = self.tree.node_mut(self.current);
        if let Some(prose) = prose {
            append_comment(&mut node.comment, &prose);
        }
        if eval.is_some() {
            node.eval = eval;
        }
    }
}

/// Visitor that builds one [`MoveTree`] per game.
struct TreeBuilder;

impl Visitor for TreeBuilder {
    type Tags = GameTags;
    type Movetext = TreeState;
    type Output = Result<MoveTree, PgnError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut GameTags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let name = String::from_utf8_lossy(name).into_owned();
        tags.headers.insert(name, value.decode_utf8_lossy().into_owned());
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<Self::Output, TreeState> {
        let board = match tags.headers.get("FEN") {
            Some(fen) => {
                let parsed = fen
                    .parse::<Fen>()
                    .map_err(|e| PgnError::InvalidFen(format!("{fen}: {e}")))
                    .and_then(|f| {
                        f.into_position::<Chess>(CastlingMode::Standard)
                            .map_err(|e| PgnError::InvalidFen(format!("{fen}: {e}")))
                    });
                match parsed {
                    Ok(board) => board,
                    Err(e) => return ControlFlow::Break(Err(e)),
                }
            }
            None => Chess::default(),
        };

        let black_to_move = board.turn().is_black();
        let root_ply = (board.fullmoves().get() - 1) * 2 + u32::from(black_to_move);

        let mut tree = MoveTree::new(canonical_position(&board), root_ply);
        tree.set_headers(tags.headers);
        let root = tree.root();

        ControlFlow::Continue(TreeState {
            tree,
            boards: vec![board],
            current: root,
            stack: Vec::new(),
            pending: Vec::new(),
            in_fresh_variation: false,
        })
    }

    fn san(&mut self, state: &mut TreeState, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let board = &state.boards[state.current.0];
        let ply = state.tree.node(state.current).ply + 1;

        let next = match san_plus.san.to_move(board) {
            Ok(mv) => board.clone().play(mv).ok(),
            Err(_) => None,
        };
        let Some(next) = next else {
            return ControlFlow::Break(Err(PgnError::IllegalMove {
                san: san_plus.to_string(),
                ply,
            }));
        };

        let child = state
            .tree
            .add_child(state.current, san_plus.to_string(), canonical_position(&next));
        state.boards.push(next);
        state.current = child;

        if state.in_fresh_variation {
            state.in_fresh_variation = false;
            for text in std::mem::take(&mut state.pending) {
                state.attach_comment(&text);
            }
        }
        ControlFlow::Continue(())
    }

    fn nag(&mut self, state: &mut TreeState, nag: Nag) -> ControlFlow<Self::Output> {
        state.tree.node_mut(state.current).nags.push(nag.0);
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        state: &mut TreeState,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let text = String::from_utf8_lossy(comment.as_bytes()).trim().to_string();
        if text.is_empty() {
            return ControlFlow::Continue(());
        }
        if state.in_fresh_variation {
            state.pending.push(text);
        } else {
            state.attach_comment(&text);
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, state: &mut TreeState) -> ControlFlow<Self::Output, Skip> {
        state.stack.push(state.current);
        // A variation replaces the move just played.
        if let Some(parent) = state.tree.parent(state.current) {
            state.current = parent;
        }
        state.in_fresh_variation = true;
        state.pending.clear();
        ControlFlow::Continue(Skip(false))
    }

    fn end_variation(&mut self, state: &mut TreeState) -> ControlFlow<Self::Output> {
        if state.in_fresh_variation {
            // Variation without moves: keep its prose on the branch point.
            state.in_fresh_variation = false;
            for text in std::mem::take(&mut state.pending) {
                state.attach_comment(&text);
            }
        }
        if let Some(back) = state.stack.pop() {
            state.current = back;
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, state: TreeState) -> Self::Output {
        Ok(state.tree)
    }
}
