use serde::Serialize;

use super::engine::PositionEngine;
use super::error::{MoveError, TimelineError};

pub(crate) const RESULT_MARKERS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Split a dataset move cell into SAN tokens.
///
/// Move numbers (`1.`, `1...`) and result markers are dropped. A number glued
/// to its move (`1.e4`) keeps the move part.
pub fn split_moves(movetext: &str) -> Vec<String> {
    movetext
        .split_whitespace()
        .filter_map(|token| {
            let token = strip_move_number(token);
            if token.is_empty() || RESULT_MARKERS.contains(&token) {
                None
            } else {
                Some(token.to_string())
            }
        })
        .collect()
}

pub(crate) fn strip_move_number(token: &str) -> &str {
    let digits = token.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return token;
    }
    let rest = &token[digits..];
    if rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

/// One reached ply with the position it leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlyRecord {
    pub ply: usize,
    #[serde(rename = "move")]
    pub san: String,
    pub fen: String,
}

/// Replay `moves` from the initial position, recording the FEN after each ply.
/// Stops at the first move the engine rejects.
pub fn timeline<E, S>(engine: &E, moves: &[S]) -> Result<Vec<PlyRecord>, MoveError>
where
    E: PositionEngine,
    S: AsRef<str>,
{
    let mut pos = engine.initial_position();
    let mut plies = Vec::with_capacity(moves.len());

    for (i, san) in moves.iter().enumerate() {
        pos = engine.apply_move(&pos, san.as_ref())?;
        plies.push(PlyRecord {
            ply: i + 1,
            san: san.as_ref().trim().to_string(),
            fen: engine.fen(&pos),
        });
    }

    Ok(plies)
}

pub fn timeline_json<E, S>(engine: &E, moves: &[S]) -> Result<String, TimelineError>
where
    E: PositionEngine,
    S: AsRef<str>,
{
    let plies = timeline(engine, moves)?;
    Ok(serde_json::to_string(&plies)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::engine::StandardEngine;

    #[test]
    fn test_split_moves_plain_sans() {
        assert_eq!(split_moves("e4 e5 Nf3"), ["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_split_moves_collapses_whitespace() {
        assert_eq!(split_moves("  e4   e5\t Nf3 "), ["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_split_moves_empty() {
        assert!(split_moves("").is_empty());
        assert!(split_moves("   ").is_empty());
    }

    #[test]
    fn test_split_moves_drops_numbers_and_results() {
        assert_eq!(
            split_moves("1. e4 e5 2. Nf3 Nc6 1-0"),
            ["e4", "e5", "Nf3", "Nc6"]
        );
        assert_eq!(split_moves("1... c5 *"), ["c5"]);
    }

    #[test]
    fn test_split_moves_glued_numbers() {
        assert_eq!(split_moves("1.d4 d5 2.c4"), ["d4", "d5", "c4"]);
    }

    #[test]
    fn test_split_moves_keeps_castling() {
        assert_eq!(split_moves("O-O O-O-O"), ["O-O", "O-O-O"]);
    }

    #[test]
    fn test_timeline_records_each_ply() {
        let plies = timeline(&StandardEngine, &["e4", "e5"]).unwrap();
        assert_eq!(plies.len(), 2);
        assert_eq!(plies[0].ply, 1);
        assert_eq!(plies[0].san, "e4");
        assert_eq!(
            plies[1].fen,
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
    }

    #[test]
    fn test_timeline_stops_at_illegal_move() {
        let err = timeline(&StandardEngine, &["e4", "e4"]).unwrap_err();
        assert_eq!(err.notation(), "e4");
    }

    #[test]
    fn test_timeline_json_shape() {
        let json = timeline_json(&StandardEngine, &["d4"]).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains(r#""ply":1,"move":"d4","fen":"#));
    }

    #[test]
    fn test_timeline_json_reports_rejected_move() {
        let err = timeline_json(&StandardEngine, &["e4", "Ke3"]).unwrap_err();
        assert!(matches!(err, TimelineError::Move(ref e) if e.notation() == "Ke3"));
    }

    #[test]
    fn test_timeline_json_empty_line() {
        assert_eq!(timeline_json::<_, &str>(&StandardEngine, &[]).unwrap(), "[]");
    }
}
