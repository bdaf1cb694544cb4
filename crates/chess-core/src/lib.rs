//! Move-tree model for annotated PGN games.

pub mod game_data;
pub mod move_tree;
pub mod pgn;
pub mod position;

pub use game_data::GameMetadata;
pub use move_tree::{MoveNode, MoveTree, NodeId};
pub use pgn::{parse_game, read_games, PgnError};
