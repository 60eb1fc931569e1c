use std::io::Read;
use std::path::Path;

use super::codec::{self, GameHeaders};
use super::cursor::{MoveCursor, Step};
use super::dataset::{CompressionMode, open_input_stream};
use super::engine::{PositionEngine, StandardEngine};
use super::error::{ImportError, MoveError};
use super::types::{GameTags, OpeningRecord};

/// Walks the recorded moves of the selected opening.
#[derive(Clone)]
pub struct OpeningPlayer<E: PositionEngine = StandardEngine> {
    cursor: MoveCursor<E>,
    selected: Option<String>,
}

impl Default for OpeningPlayer<StandardEngine> {
    fn default() -> Self {
        Self::with_engine(StandardEngine)
    }
}

impl<E: PositionEngine> OpeningPlayer<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            cursor: MoveCursor::with_engine(engine),
            selected: None,
        }
    }

    /// Resets the cursor only when `record` differs by name from the current
    /// selection. Returns whether a reset happened.
    pub fn select(&mut self, record: &OpeningRecord) -> bool {
        if self.selected.as_deref() == Some(record.name.as_str()) {
            return false;
        }

        log::debug!("selected opening '{}' ({})", record.name, record.eco);
        self.selected = Some(record.name.clone());
        self.cursor.reset(&record.moves);
        true
    }

    /// Forget the selection; the next `select` of any record resets.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn step_forward(&mut self) -> Result<Step, MoveError> {
        self.cursor.step_forward()
    }

    pub fn step_backward(&mut self) -> Result<Step, MoveError> {
        self.cursor.step_backward()
    }

    pub fn cursor(&self) -> &MoveCursor<E> {
        &self.cursor
    }
}

/// Identity of an uploaded notation file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportKey {
    pub name: String,
    pub size: u64,
}

impl ImportKey {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported { moves: usize },
    /// Same upload as last time; nothing was done.
    AlreadyImported,
}

/// Free-form board: typed moves, PGN import and export.
#[derive(Clone)]
pub struct InteractiveBoard<E: PositionEngine = StandardEngine> {
    cursor: MoveCursor<E>,
    last_import: Option<ImportKey>,
    headers: GameHeaders,
}

impl Default for InteractiveBoard<StandardEngine> {
    fn default() -> Self {
        Self::with_engine(StandardEngine)
    }
}

impl<E: PositionEngine> InteractiveBoard<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            cursor: MoveCursor::with_engine(engine),
            last_import: None,
            headers: GameHeaders::default(),
        }
    }

    pub fn submit_move(&mut self, notation: &str) -> Result<(), MoveError> {
        self.cursor.append_move(notation)
    }

    pub fn step_forward(&mut self) -> Result<Step, MoveError> {
        self.cursor.step_forward()
    }

    pub fn step_backward(&mut self) -> Result<Step, MoveError> {
        self.cursor.step_backward()
    }

    /// Decode `text` and replace the line with its mainline. An upload with
    /// the same key as the previous one is skipped, whether or not that one
    /// succeeded. On failure the board and its headers are left as they were.
    pub fn import_text(&mut self, key: ImportKey, text: &str) -> Result<ImportOutcome, ImportError> {
        if self.last_import.as_ref() == Some(&key) {
            log::debug!("skipping repeated import of '{}'", key.name);
            return Ok(ImportOutcome::AlreadyImported);
        }

        log::debug!("importing '{}' ({} bytes)", key.name, key.size);
        self.last_import = Some(key);

        let game = codec::parse_game(text)
            .map_err(ImportError::from)
            .and_then(|game| {
                self.cursor.import_moves(game.moves.as_slice())?;
                Ok(game)
            })
            .inspect_err(|e| log::warn!("rejected import: {e}"))?;
        self.headers = game.headers;

        Ok(ImportOutcome::Imported {
            moves: self.cursor.len(),
        })
    }

    /// Read a PGN file (`.zst` files are decompressed) and import it, keyed by
    /// file name and size on disk.
    pub fn import_file(&mut self, path: &Path) -> Result<ImportOutcome, ImportError> {
        let file_error = |message: String| ImportError::File {
            path: path.to_path_buf(),
            message,
        };

        let size = std::fs::metadata(path)
            .map_err(|e| file_error(e.to_string()))?
            .len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let key = ImportKey::new(name, size);

        if self.last_import.as_ref() == Some(&key) {
            return Ok(ImportOutcome::AlreadyImported);
        }

        let mut input = open_input_stream(path, CompressionMode::for_path(path, None))
            .map_err(|e| file_error(e.to_string()))?;
        let mut text = String::new();
        input
            .read_to_string(&mut text)
            .map_err(|e| file_error(e.to_string()))?;

        self.import_text(key, &text)
    }

    /// Export the reached moves. Event, Site and player names of the last
    /// imported game take precedence over `tags`.
    pub fn export(&self, tags: &GameTags) -> String {
        let mut tags = tags.clone();
        self.headers.apply_to(&mut tags);
        self.cursor.export_notation(&tags)
    }

    /// Headers of the last successfully imported game.
    pub fn headers(&self) -> &GameHeaders {
        &self.headers
    }

    /// Back to the initial position with no history.
    pub fn clear(&mut self) {
        self.cursor.reset::<&str>(&[]);
        self.last_import = None;
        self.headers = GameHeaders::default();
    }

    pub fn cursor(&self) -> &MoveCursor<E> {
        &self.cursor
    }
}

/// Per-user state: one opening player and one interactive board, alive for
/// the whole session.
#[derive(Clone, Default)]
pub struct Session {
    pub opening: OpeningPlayer,
    pub board: InteractiveBoard,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}
