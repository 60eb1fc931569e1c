use chrono::{Local, NaiveDate};

/// One row of the openings dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpeningRecord {
    pub eco: String,
    pub name: String,
    pub moves: Vec<String>,
    pub description: String,
}

impl OpeningRecord {
    /// Moves joined back into the space-separated form used by the dataset.
    pub fn moves_text(&self) -> String {
        self.moves.join(" ")
    }
}

/// Seven-tag-roster values written at the top of an exported game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTags {
    pub event: String,
    pub site: String,
    pub date: NaiveDate,
    pub round: String,
    pub white: String,
    pub black: String,
    /// `*` while the game is in progress or the outcome is unknown.
    pub result: String,
}

impl GameTags {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            event: "Interactive Game".to_string(),
            site: "Chess Openings Dashboard".to_string(),
            date,
            round: "1".to_string(),
            white: "Player 1".to_string(),
            black: "Player 2".to_string(),
            result: "*".to_string(),
        }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn pgn_date(&self) -> String {
        self.date.format("%Y.%m.%d").to_string()
    }
}

impl Default for GameTags {
    fn default() -> Self {
        Self::today()
    }
}
