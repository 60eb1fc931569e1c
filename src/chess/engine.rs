use std::fmt::Write;

use shakmaty::{Chess, Color, EnPassantMode, File, Position, Rank, Square, fen::Fen, san::SanPlus};

use super::error::MoveError;

/// Rules collaborator behind a move cursor.
///
/// Positions are values: applying a move yields a new position and leaves
/// the input untouched, so a failed application never disturbs the caller.
pub trait PositionEngine {
    type Position: Clone;

    fn initial_position(&self) -> Self::Position;

    fn apply_move(
        &self,
        position: &Self::Position,
        notation: &str,
    ) -> Result<Self::Position, MoveError>;

    fn fen(&self, position: &Self::Position) -> String;

    fn render(&self, position: &Self::Position) -> String;
}

/// Standard chess from the usual starting position, backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEngine;

impl PositionEngine for StandardEngine {
    type Position = Chess;

    fn initial_position(&self) -> Chess {
        Chess::default()
    }

    fn apply_move(&self, position: &Chess, notation: &str) -> Result<Chess, MoveError> {
        let token = notation.trim();
        let san: SanPlus = token
            .parse()
            .map_err(|_| MoveError::UnparsableNotation(token.to_string()))?;

        let m = san
            .san
            .to_move(position)
            .map_err(|e| MoveError::IllegalMove {
                notation: token.to_string(),
                reason: e.to_string(),
            })?;

        let mut next = position.clone();
        next.play_unchecked(m);
        Ok(next)
    }

    fn fen(&self, position: &Chess) -> String {
        Fen::from_position(position, EnPassantMode::Legal).to_string()
    }

    fn render(&self, position: &Chess) -> String {
        let board = position.board();
        let mut out = String::with_capacity(200);

        for rank in Rank::ALL.iter().rev() {
            let _ = write!(out, "{} ", rank.char());
            for file in File::ALL {
                let square = Square::from_coords(file, *rank);
                let glyph = board.piece_at(square).map_or('.', |piece| piece.char());
                out.push(' ');
                out.push(glyph);
            }
            out.push('\n');
        }

        out.push_str("  ");
        for file in File::ALL {
            out.push(' ');
            out.push(file.char());
        }
        out.push('\n');

        let side = match position.turn() {
            Color::White => "white",
            Color::Black => "black",
        };
        let _ = write!(out, "{side} to move");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_initial_position_fen() {
        let engine = StandardEngine;
        assert_eq!(engine.fen(&engine.initial_position()), START_FEN);
    }

    #[test]
    fn test_apply_legal_move() {
        let engine = StandardEngine;
        let pos = engine.apply_move(&engine.initial_position(), "e4").unwrap();
        assert_eq!(
            engine.fen(&pos),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_apply_move_trims_whitespace() {
        let engine = StandardEngine;
        assert!(engine.apply_move(&engine.initial_position(), "  Nf3 ").is_ok());
    }

    #[test]
    fn test_apply_illegal_move() {
        let engine = StandardEngine;
        let err = engine
            .apply_move(&engine.initial_position(), "e5")
            .unwrap_err();
        assert!(matches!(err, MoveError::IllegalMove { ref notation, .. } if notation == "e5"));
    }

    #[test]
    fn test_apply_unparsable_move() {
        let engine = StandardEngine;
        let err = engine
            .apply_move(&engine.initial_position(), "hello")
            .unwrap_err();
        assert_eq!(err, MoveError::UnparsableNotation("hello".to_string()));
    }

    #[test]
    fn test_apply_empty_notation_is_unparsable() {
        let engine = StandardEngine;
        let err = engine.apply_move(&engine.initial_position(), "").unwrap_err();
        assert_eq!(err, MoveError::UnparsableNotation(String::new()));
    }

    #[test]
    fn test_failed_apply_leaves_input_untouched() {
        let engine = StandardEngine;
        let start = engine.initial_position();
        let _ = engine.apply_move(&start, "Ke2");
        assert_eq!(engine.fen(&start), START_FEN);
    }

    #[test]
    fn test_render_start_position() {
        let engine = StandardEngine;
        let diagram = engine.render(&engine.initial_position());
        let lines: Vec<&str> = diagram.lines().collect();

        assert_eq!(lines[0], "8  r n b q k b n r");
        assert_eq!(lines[3], "5  . . . . . . . .");
        assert_eq!(lines[7], "1  R N B Q K B N R");
        assert_eq!(lines[8], "   a b c d e f g h");
        assert_eq!(lines[9], "white to move");
    }
}
