//! Canonical position strings used to detect transpositions.

use shakmaty::{fen::Fen, Chess, EnPassantMode};

/// Normalized FEN: placement, side to move, castling rights and legal en-passant square.
/// Halfmove clock and fullmove number are dropped, so the same position reached by
/// different move orders yields the same string.
pub fn canonical_position(board: &Chess) -> String {
    let fen = Fen::from_position(board, EnPassantMode::Legal);
    fen.to_string()
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{san::San, Position};

    fn play(moves: &[&str]) -> Chess {
        let mut board = Chess::default();
        for san in moves {
            let san: San = san.parse().unwrap();
            let mv = san.to_move(&board).unwrap();
            board = board.play(mv).unwrap();
        }
        board
    }

    #[test]
    fn test_start_position() {
        assert_eq!(
            canonical_position(&Chess::default()),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
        );
    }

    #[test]
    fn test_transposed_move_orders_match() {
        let a = play(&["Nf3", "Nf6", "d4", "d5"]);
        let b = play(&["d4", "d5", "Nf3", "Nf6"]);
        assert_eq!(canonical_position(&a), canonical_position(&b));
    }

    #[test]
    fn test_unusable_en_passant_square_dropped() {
        // No black pawn can capture on e3, so the square is not part of the position.
        let board = play(&["e4"]);
        assert!(canonical_position(&board).ends_with(" b KQkq -"));
    }
}
