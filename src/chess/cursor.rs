//! Move cursor: a move list, a count of applied moves, and the position that
//! count leads to.
//!
//! The held position is always the result of applying `moves[..index]` from
//! the engine's initial position. Every operation either keeps that true or
//! leaves the cursor exactly as it was.

use super::codec;
use super::engine::{PositionEngine, StandardEngine};
use super::error::{ImportError, MoveError};
use super::types::GameTags;

/// Result of a step request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    /// Already at the end (forward) or the start (backward); nothing changed.
    Boundary,
}

#[derive(Clone)]
pub struct MoveCursor<E: PositionEngine = StandardEngine> {
    engine: E,
    moves: Vec<String>,
    index: usize,
    position: E::Position,
}

impl MoveCursor<StandardEngine> {
    pub fn new() -> Self {
        Self::with_engine(StandardEngine)
    }
}

impl Default for MoveCursor<StandardEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PositionEngine> MoveCursor<E> {
    pub fn with_engine(engine: E) -> Self {
        let position = engine.initial_position();
        Self {
            engine,
            moves: Vec::new(),
            index: 0,
            position,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// The reached prefix `moves[..index]`.
    pub fn played(&self) -> &[String] {
        &self.moves[..self.index]
    }

    pub fn position(&self) -> &E::Position {
        &self.position
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn can_step_forward(&self) -> bool {
        self.index < self.moves.len()
    }

    pub fn can_step_backward(&self) -> bool {
        self.index > 0
    }

    pub fn fen(&self) -> String {
        self.engine.fen(&self.position)
    }

    pub fn render(&self) -> String {
        self.engine.render(&self.position)
    }

    pub fn reset<S: AsRef<str>>(&mut self, moves: &[S]) {
        self.moves = moves.iter().map(|m| m.as_ref().to_string()).collect();
        self.index = 0;
        self.position = self.engine.initial_position();
        log::debug!("cursor reset to {} moves", self.moves.len());
    }

    pub fn step_forward(&mut self) -> Result<Step, MoveError> {
        let Some(next) = self.moves.get(self.index) else {
            return Ok(Step::Boundary);
        };

        self.position = self.engine.apply_move(&self.position, next)?;
        self.index += 1;
        log::debug!("cursor forward to {}/{}", self.index, self.moves.len());
        Ok(Step::Moved)
    }

    /// Rebuilds the position from scratch instead of undoing, so it does not
    /// depend on the engine keeping any history.
    pub fn step_backward(&mut self) -> Result<Step, MoveError> {
        if self.index == 0 {
            return Ok(Step::Boundary);
        }

        let target = self.index - 1;
        self.position = self
            .replay(&self.moves[..target])
            .map_err(|(_, err)| err)?;
        self.index = target;
        log::debug!("cursor back to {}/{}", self.index, self.moves.len());
        Ok(Step::Moved)
    }

    /// Play `notation` from the current position. The abandoned tail beyond
    /// the cursor is only discarded once the move has been accepted.
    pub fn append_move(&mut self, notation: &str) -> Result<(), MoveError> {
        let notation = notation.trim();
        let next = self.engine.apply_move(&self.position, notation)?;

        if self.index < self.moves.len() {
            log::debug!(
                "discarding {} moves beyond ply {}",
                self.moves.len() - self.index,
                self.index
            );
            self.moves.truncate(self.index);
        }

        self.moves.push(notation.to_string());
        self.index = self.moves.len();
        self.position = next;
        Ok(())
    }

    /// Replace the whole line. Validated on a fresh position first; any
    /// failure leaves the cursor untouched.
    pub fn import_moves<S: AsRef<str>>(&mut self, moves: &[S]) -> Result<(), ImportError> {
        let position = self
            .replay(moves)
            .map_err(|(ply, source)| ImportError::ImportFailed {
                ply,
                notation: source.notation().to_string(),
                source,
            })?;

        self.moves = moves.iter().map(|m| m.as_ref().trim().to_string()).collect();
        self.index = self.moves.len();
        self.position = position;
        log::debug!("cursor imported {} moves", self.moves.len());
        Ok(())
    }

    /// PGN for the reached prefix only.
    pub fn export_notation(&self, tags: &GameTags) -> String {
        codec::serialize_game(self.played(), tags)
    }

    /// On failure returns the 1-based ply of the rejected move.
    fn replay<S: AsRef<str>>(&self, moves: &[S]) -> Result<E::Position, (usize, MoveError)> {
        let mut pos = self.engine.initial_position();
        for (i, notation) in moves.iter().enumerate() {
            pos = self
                .engine
                .apply_move(&pos, notation.as_ref())
                .map_err(|err| (i + 1, err))?;
        }
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E4_E5_FEN: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn tags() -> GameTags {
        GameTags::new(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap())
    }

    fn cursor_at_end(moves: &[&str]) -> MoveCursor {
        let mut cursor = MoveCursor::new();
        for m in moves {
            cursor.append_move(m).unwrap();
        }
        cursor
    }

    #[test]
    fn test_new_cursor_is_at_start() {
        let cursor = MoveCursor::new();
        assert_eq!(cursor.index(), 0);
        assert!(cursor.is_empty());
        assert_eq!(cursor.fen(), START_FEN);
        assert!(!cursor.can_step_forward());
        assert!(!cursor.can_step_backward());
    }

    #[test]
    fn test_kings_pawn_game_walk() {
        let mut cursor = MoveCursor::new();
        cursor.reset(&["e4", "e5"]);
        assert_eq!(cursor.index(), 0);

        assert_eq!(cursor.step_forward(), Ok(Step::Moved));
        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.fen(), AFTER_E4_FEN);

        assert_eq!(cursor.step_forward(), Ok(Step::Moved));
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.fen(), AFTER_E4_E5_FEN);

        assert_eq!(cursor.step_forward(), Ok(Step::Boundary));
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.fen(), AFTER_E4_E5_FEN);
    }

    #[test]
    fn test_full_walk_of_legal_line() {
        let line = ["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "a6"];
        let mut cursor = MoveCursor::new();
        cursor.reset(&line);

        for _ in 0..line.len() {
            assert_eq!(cursor.step_forward(), Ok(Step::Moved));
        }
        assert_eq!(cursor.index(), line.len());
        assert!(!cursor.can_step_forward());
    }

    #[test]
    fn test_reset_copies_moves_and_restarts() {
        let mut source = vec!["d4".to_string(), "d5".to_string()];
        let mut cursor = MoveCursor::new();
        cursor.reset(&source);
        cursor.step_forward().unwrap();

        source.push("c4".to_string());
        assert_eq!(cursor.len(), 2);

        cursor.reset(&["e4"]);
        assert_eq!(cursor.index(), 0);
        assert_eq!(cursor.moves(), ["e4"]);
        assert_eq!(cursor.fen(), START_FEN);
    }

    #[test]
    fn test_forward_then_backward_restores_position() {
        let mut cursor = MoveCursor::new();
        cursor.reset(&["e4", "e5", "Nf3"]);
        cursor.step_forward().unwrap();
        let before = cursor.fen();

        cursor.step_forward().unwrap();
        cursor.step_backward().unwrap();

        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.fen(), before);
    }

    #[test]
    fn test_step_backward_at_start_is_boundary() {
        let mut cursor = MoveCursor::new();
        cursor.reset(&["e4"]);
        assert_eq!(cursor.step_backward(), Ok(Step::Boundary));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_illegal_recorded_move_does_not_advance() {
        let mut cursor = MoveCursor::new();
        cursor.reset(&["e4", "Ke3", "Nf3"]);
        cursor.step_forward().unwrap();

        let err = cursor.step_forward().unwrap_err();
        assert!(matches!(err, MoveError::IllegalMove { .. }));
        assert_eq!(cursor.index(), 1);
        assert_eq!(cursor.fen(), AFTER_E4_FEN);

        // Still usable afterwards.
        assert_eq!(cursor.step_backward(), Ok(Step::Moved));
        assert_eq!(cursor.fen(), START_FEN);
    }

    #[test]
    fn test_unparsable_recorded_move_does_not_advance() {
        let mut cursor = MoveCursor::new();
        cursor.reset(&["???"]);
        assert_eq!(
            cursor.step_forward(),
            Err(MoveError::UnparsableNotation("???".to_string()))
        );
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_append_move_extends_line() {
        let cursor = cursor_at_end(&["e4", "e5"]);
        assert_eq!(cursor.moves(), ["e4", "e5"]);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.fen(), AFTER_E4_E5_FEN);
    }

    #[test]
    fn test_append_move_trims_input() {
        let cursor = cursor_at_end(&[" e4 "]);
        assert_eq!(cursor.moves(), ["e4"]);
    }

    #[test]
    fn test_append_after_stepping_back_truncates_tail() {
        let mut cursor = cursor_at_end(&["e4", "e5", "Nf3", "Nc6"]);
        cursor.step_backward().unwrap();
        cursor.step_backward().unwrap();

        cursor.append_move("Bc4").unwrap();
        assert_eq!(cursor.moves(), ["e4", "e5", "Bc4"]);
        assert_eq!(cursor.index(), 3);
    }

    #[test]
    fn test_illegal_append_leaves_state_unchanged() {
        let mut cursor = cursor_at_end(&["e4", "e5", "Nf3"]);
        cursor.step_backward().unwrap();
        let fen = cursor.fen();

        let err = cursor.append_move("Ke3").unwrap_err();
        assert!(matches!(err, MoveError::IllegalMove { .. }));
        assert_eq!(cursor.moves(), ["e4", "e5", "Nf3"]);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.fen(), fen);
    }

    #[test]
    fn test_unparsable_append_leaves_state_unchanged() {
        let mut cursor = cursor_at_end(&["d4"]);
        assert!(matches!(
            cursor.append_move("not-a-move"),
            Err(MoveError::UnparsableNotation(_))
        ));
        assert_eq!(cursor.moves(), ["d4"]);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_import_moves_replaces_line() {
        let mut cursor = cursor_at_end(&["d4"]);
        cursor.import_moves(&["e4", "e5"]).unwrap();

        assert_eq!(cursor.moves(), ["e4", "e5"]);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.fen(), AFTER_E4_E5_FEN);
    }

    #[test]
    fn test_import_is_atomic_on_failure() {
        let mut cursor = cursor_at_end(&["d4", "d5", "c4"]);
        cursor.step_backward().unwrap();
        let fen = cursor.fen();

        let err = cursor.import_moves(&["e4", "e5", "Ke3", "Nf3"]).unwrap_err();
        match err {
            ImportError::ImportFailed { ply, notation, .. } => {
                assert_eq!(ply, 3);
                assert_eq!(notation, "Ke3");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(cursor.moves(), ["d4", "d5", "c4"]);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.fen(), fen);
    }

    #[test]
    fn test_step_back_after_import_replays() {
        let mut cursor = MoveCursor::new();
        cursor.import_moves(&["e4", "e5", "Nf3"]).unwrap();
        cursor.step_backward().unwrap();
        assert_eq!(cursor.fen(), AFTER_E4_E5_FEN);
    }

    #[test]
    fn test_export_after_two_back_steps_only_has_reached_prefix() {
        let mut cursor = cursor_at_end(&["e4", "e5", "Nf3", "Nc6"]);
        cursor.step_backward().unwrap();
        cursor.step_backward().unwrap();

        let pgn = cursor.export_notation(&tags());
        assert!(pgn.contains("1. e4 e5 *"));
        assert!(!pgn.contains("Nf3"));
        assert!(!pgn.contains("Nc6"));
    }

    #[test]
    fn test_export_empty_cursor() {
        let pgn = MoveCursor::new().export_notation(&tags());
        assert!(pgn.contains("[Result \"*\"]"));
        assert!(pgn.ends_with("\n\n*\n"));
    }
}
