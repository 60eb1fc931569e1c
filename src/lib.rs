//! Chess openings browser: a filterable openings table, a player that walks
//! the selected opening, and a free-form board with PGN import and export.

pub mod chess;

pub use chess::*;
