use std::path::PathBuf;

use thiserror::Error;

/// Failure to apply a single move to a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The token is not valid SAN at all.
    #[error("unparsable move notation '{0}'")]
    UnparsableNotation(String),
    /// Valid SAN, but not playable in the current position.
    #[error("illegal move '{notation}': {reason}")]
    IllegalMove { notation: String, reason: String },
}

impl MoveError {
    pub fn notation(&self) -> &str {
        match self {
            Self::UnparsableNotation(notation) => notation,
            Self::IllegalMove { notation, .. } => notation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("no game found in notation text")]
    NoGame,
    #[error("malformed game notation: {0}")]
    Malformed(String),
    #[error("move {ply} ('{notation}') is not valid move notation")]
    UnparsableMove { ply: usize, notation: String },
}

/// Import is all-or-nothing; the first failing move aborts it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("failed to read '{}': {message}", .path.display())]
    File { path: PathBuf, message: String },
    #[error("could not read game notation: {0}")]
    Unreadable(#[source] CodecError),
    #[error("import failed at move {ply} ('{notation}'): {source}")]
    ImportFailed {
        ply: usize,
        notation: String,
        #[source]
        source: MoveError,
    },
}

impl From<CodecError> for ImportError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnparsableMove { ply, notation } => Self::ImportFailed {
                ply,
                source: MoveError::UnparsableNotation(notation.clone()),
                notation,
            },
            other => Self::Unreadable(other),
        }
    }
}

/// Failure to build a ply-by-ply timeline.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Move(#[from] MoveError),
    #[error("failed to encode timeline: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file '{}' not found", .0.display())]
    Missing(PathBuf),
    #[error("invalid dataset path pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("invalid compression value '{0}'. Supported values: 'zstd' or omitted.")]
    Compression(String),
    #[error("failed to read dataset '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode dataset '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Collects per-row diagnostics into a single `; `-separated message.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator {
    message: Option<String>,
    count: usize,
}

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        self.count += 1;
        match &mut self.message {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.message = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.count = 0;
        self.message.take()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none()
    }
}
