//! Text front end: one command in, one rendered reply out.
//!
//! Each command performs at most one cursor operation. Failures become
//! `warning:` or `error:` lines in the reply; nothing here ends the session
//! except `quit`.

use std::fmt::Write;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use super::codec::format_movetext;
use super::cursor::{MoveCursor, Step};
use super::dataset::Dataset;
use super::engine::PositionEngine;
use super::filter::{DEFAULT_KEYWORD, NO_SELECTION, NameMatcher, OpeningFilter, Summary, opening_choices};
use super::moves::timeline_json;
use super::session::{ImportOutcome, Session};
use super::types::{GameTags, OpeningRecord};

pub const HELP: &str = "\
Commands:
  eco <code|all>        filter by ECO code
  search [text]         filter by name (case-insensitive); empty clears
  list                  show the filtered openings
  stats                 summary counters for the filtered openings
  select <name|#|--->   choose an opening (number from `list`)
  show                  details and board for the selected opening
  next / prev           step through the selected opening
  move <san>            play a move on the interactive board
  forward / back        step through the interactive board
  import <file>         load a PGN file into the interactive board
  export [file]         write the interactive game as PGN
  timeline [opening|board]
                        reached moves with FEN, as JSON
  board                 show the interactive board
  clear                 reset the interactive board
  help                  this text
  quit                  leave";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{command}' needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("'timeline' takes 'opening' or 'board', not '{0}'")]
    TimelineTarget(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Opening,
    Board,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Eco(String),
    Search(String),
    List,
    Stats,
    Select(String),
    Show,
    Next,
    Prev,
    Move(String),
    Forward,
    Back,
    Import(PathBuf),
    Export(Option<PathBuf>),
    Timeline(Target),
    Board,
    Clear,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let required = |command: &'static str, what: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument { command, what })
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "eco" => Self::Eco(required("eco", "an ECO code or 'all'")?),
            "search" => Self::Search(rest.to_string()),
            "list" | "ls" => Self::List,
            "stats" => Self::Stats,
            "select" => Self::Select(required("select", "an opening name or number")?),
            "show" => Self::Show,
            "next" => Self::Next,
            "prev" => Self::Prev,
            "move" => Self::Move(required("move", "a move such as e4 or Nf3")?),
            "forward" => Self::Forward,
            "back" => Self::Back,
            "import" => Self::Import(PathBuf::from(required("import", "a PGN file path")?)),
            "export" => Self::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "timeline" => Self::Timeline(match rest.to_ascii_lowercase().as_str() {
                "" | "board" => Target::Board,
                "opening" => Target::Opening,
                _ => return Err(CommandError::TimelineTarget(rest.to_string())),
            }),
            "board" => Self::Board,
            "clear" => Self::Clear,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Err(CommandError::Unknown(word.to_string())),
        };
        Ok(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Continue(String),
    Quit,
}

/// Values written into exported games; the date is taken at export time.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub event: String,
    pub site: String,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        let tags = GameTags::today();
        Self {
            event: tags.event,
            site: tags.site,
            round: tags.round,
            white: tags.white,
            black: tags.black,
        }
    }
}

impl ExportSettings {
    pub fn tags(&self) -> GameTags {
        GameTags {
            event: self.event.clone(),
            site: self.site.clone(),
            round: self.round.clone(),
            white: self.white.clone(),
            black: self.black.clone(),
            ..GameTags::today()
        }
    }
}

pub struct Dashboard {
    dataset: Dataset,
    filter: OpeningFilter,
    keyword: String,
    keyword_matcher: NameMatcher,
    export: ExportSettings,
    session: Session,
}

impl Dashboard {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            filter: OpeningFilter::default(),
            keyword: DEFAULT_KEYWORD.to_string(),
            keyword_matcher: NameMatcher::new(DEFAULT_KEYWORD).unwrap_or_else(|_| NameMatcher::any()),
            export: ExportSettings::default(),
            session: Session::new(),
        }
    }

    pub fn with_keyword(mut self, keyword: &str) -> Result<Self, regex::Error> {
        self.keyword_matcher = NameMatcher::new(keyword)?;
        self.keyword = keyword.trim().to_string();
        Ok(self)
    }

    pub fn with_export_settings(mut self, export: ExportSettings) -> Self {
        self.export = export;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn filter(&self) -> &OpeningFilter {
        &self.filter
    }

    pub fn filtered(&self) -> Vec<&OpeningRecord> {
        self.dataset.filtered(&self.filter)
    }

    pub fn summary(&self) -> Summary {
        Summary::new(&self.filtered(), &self.keyword_matcher)
    }

    /// Parse and run one input line.
    pub fn handle_line(&mut self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::Continue(String::new());
        }
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => Reply::Continue(format!("error: {e}")),
        }
    }

    pub fn execute(&mut self, command: Command) -> Reply {
        let text = match command {
            Command::Quit => return Reply::Quit,
            Command::Help => HELP.to_string(),
            Command::Eco(code) => self.set_eco(&code),
            Command::Search(query) => self.set_search(&query),
            Command::List => self.render_list(),
            Command::Stats => self.render_stats(),
            Command::Select(choice) => self.select(&choice),
            Command::Show => self.render_opening(),
            Command::Next => self.step_opening(true),
            Command::Prev => self.step_opening(false),
            Command::Move(san) => self.submit_move(&san),
            Command::Forward => self.step_board(true),
            Command::Back => self.step_board(false),
            Command::Import(path) => self.import(path),
            Command::Export(path) => self.export(path),
            Command::Timeline(target) => self.render_timeline(target),
            Command::Board => self.render_board(),
            Command::Clear => {
                self.session.board.clear();
                self.render_board()
            }
        };
        Reply::Continue(text)
    }

    /// Greeting shown once at start-up.
    pub fn welcome(&self) -> String {
        let mut out = String::from(
            "Chess Openings Dashboard\n\
             - Filter the openings with 'eco' and 'search', then 'list' them.\n\
             - 'select' an opening to see its details and walk it with 'next'/'prev'.\n\
             - The interactive board takes moves with 'move'; 'help' lists everything.\n",
        );
        if self.dataset.is_empty() {
            out.push_str("warning: no chess openings data loaded; dashboard functionality will be limited\n");
        } else {
            let _ = writeln!(out, "{} openings loaded.", self.dataset.len());
        }
        out
    }

    fn set_eco(&mut self, code: &str) -> String {
        let choices = self.dataset.eco_choices();
        let Some(choice) = choices.iter().find(|c| c.eq_ignore_ascii_case(code.trim())) else {
            return format!(
                "warning: unknown ECO code '{}'; choose one of: {}",
                code.trim(),
                choices.join(", ")
            );
        };

        self.filter.set_eco(choice);
        self.sync_selection();
        self.render_filter_line()
    }

    fn set_search(&mut self, query: &str) -> String {
        if let Err(e) = self.filter.set_query(query) {
            return format!("error: invalid search '{query}': {e}");
        }
        self.sync_selection();
        self.render_filter_line()
    }

    /// A selection outside the filtered view falls back to the placeholder.
    fn sync_selection(&mut self) {
        let Some(name) = self.session.opening.selected() else {
            return;
        };
        if !self.filtered().iter().any(|r| r.name == name) {
            self.session.opening.deselect();
        }
    }

    fn select(&mut self, choice: &str) -> String {
        let choice = choice.trim();
        if choice == NO_SELECTION {
            self.session.opening.deselect();
            return "Selection cleared.".to_string();
        }

        let choices = opening_choices(&self.filtered());
        let name = match choice.parse::<usize>() {
            Ok(0) => {
                self.session.opening.deselect();
                return "Selection cleared.".to_string();
            }
            Ok(n) => choices.get(n).cloned(),
            Err(_) => choices
                .iter()
                .skip(1)
                .find(|c| c.as_str() == choice)
                .or_else(|| choices.iter().skip(1).find(|c| c.eq_ignore_ascii_case(choice)))
                .cloned(),
        };

        let Some(record) = name.and_then(|n| self.dataset.find(&n).cloned()) else {
            return format!("warning: no opening '{choice}' in the current view");
        };

        self.session.opening.select(&record);
        self.render_opening()
    }

    fn step_opening(&mut self, forward: bool) -> String {
        if self.session.opening.selected().is_none() {
            return "warning: select an opening first".to_string();
        }

        let result = if forward {
            self.session.opening.step_forward()
        } else {
            self.session.opening.step_backward()
        };

        let mut out = String::new();
        match result {
            Ok(Step::Moved) => {}
            Ok(Step::Boundary) if forward => out.push_str("warning: no more moves to play\n"),
            Ok(Step::Boundary) => out.push_str("warning: already at the starting position\n"),
            Err(e) => {
                log::warn!("opening step rejected: {e}");
                let _ = writeln!(out, "warning: invalid move '{}': {e}", e.notation());
            }
        }
        out.push_str(&render_cursor(self.session.opening.cursor(), OPENING_STEPS));
        out
    }

    fn submit_move(&mut self, san: &str) -> String {
        match self.session.board.submit_move(san) {
            Ok(()) => format!(
                "Move '{}' made successfully.\n{}",
                san.trim(),
                render_cursor(self.session.board.cursor(), BOARD_STEPS)
            ),
            Err(e) => format!("error: invalid move '{}': {e}", san.trim()),
        }
    }

    fn step_board(&mut self, forward: bool) -> String {
        let result = if forward {
            self.session.board.step_forward()
        } else {
            self.session.board.step_backward()
        };

        let mut out = String::new();
        match result {
            Ok(Step::Moved) => {}
            Ok(Step::Boundary) if forward => out.push_str("warning: already at the latest move\n"),
            Ok(Step::Boundary) => out.push_str("warning: already at the starting position\n"),
            Err(e) => {
                let _ = writeln!(out, "error: could not replay '{}': {e}", e.notation());
            }
        }
        out.push_str(&render_cursor(self.session.board.cursor(), BOARD_STEPS));
        out
    }

    fn import(&mut self, path: PathBuf) -> String {
        match self.session.board.import_file(&path) {
            Ok(ImportOutcome::Imported { moves }) => {
                let board = &self.session.board;
                let mut out = format!("Imported {moves} moves from '{}'.\n", path.display());
                if let Some(game) = board.headers().describe() {
                    let _ = writeln!(out, "Game: {game}");
                }
                out.push_str(&render_cursor(board.cursor(), BOARD_STEPS));
                out
            }
            Ok(ImportOutcome::AlreadyImported) => {
                format!("'{}' was already imported; nothing changed.", path.display())
            }
            Err(e) => format!("error: {e}"),
        }
    }

    fn export(&mut self, path: Option<PathBuf>) -> String {
        let pgn = self.session.board.export(&self.export.tags());
        let Some(path) = path else {
            return pgn;
        };

        match std::fs::write(&path, &pgn) {
            Ok(()) => format!(
                "Exported {} moves to '{}'.",
                self.session.board.cursor().index(),
                path.display()
            ),
            Err(e) => format!("error: failed to write '{}': {e}", path.display()),
        }
    }

    fn render_filter_line(&self) -> String {
        let query = self.filter.query();
        format!(
            "ECO: {} | search: {} | {} openings",
            self.filter.eco(),
            if query.is_empty() { "(none)" } else { query },
            self.filtered().len()
        )
    }

    fn render_list(&self) -> String {
        let filtered = self.filtered();
        if filtered.is_empty() {
            return format!("{}\nNo openings to display.", self.render_filter_line());
        }

        let mut out = self.render_filter_line();
        out.push('\n');
        for (i, record) in filtered.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>4}  {:<4} {}  [{}]",
                i + 1,
                record.eco,
                record.name,
                record.moves_text()
            );
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn render_stats(&self) -> String {
        let summary = self.summary();
        let mut out = String::new();
        let _ = writeln!(out, "Total Openings Displayed: {}", summary.total);

        if summary.total == 0 {
            out.push_str("No data to display statistics for (or data file not found).");
            return out;
        }

        out.push_str("Openings per ECO Code:\n");
        for (code, count) in summary.histogram() {
            let _ = writeln!(out, "  {code:<4} {count:>4} {}", "#".repeat(count.min(50)));
        }
        let _ = write!(
            out,
            "Names containing '{}': {}",
            self.keyword, summary.keyword_matches
        );
        out
    }

    fn render_opening(&self) -> String {
        let Some(name) = self.session.opening.selected() else {
            return "No opening selected.".to_string();
        };
        let Some(record) = self.dataset.find(name) else {
            return "No opening selected.".to_string();
        };

        let mut out = String::new();
        let _ = writeln!(out, "{}", record.name);
        let _ = writeln!(out, "ECO: {}", record.eco);
        let _ = writeln!(out, "Moves: {}", format_movetext(&record.moves));
        let _ = writeln!(out, "Description: {}", record.description);

        if record.moves.is_empty() {
            out.push_str("No moves recorded for this opening.");
        } else {
            out.push_str(&render_cursor(self.session.opening.cursor(), OPENING_STEPS));
        }
        out
    }

    fn render_board(&self) -> String {
        render_cursor(self.session.board.cursor(), BOARD_STEPS)
    }

    fn render_timeline(&self, target: Target) -> String {
        let cursor = match target {
            Target::Opening => {
                if self.session.opening.selected().is_none() {
                    return "warning: select an opening first".to_string();
                }
                self.session.opening.cursor()
            }
            Target::Board => self.session.board.cursor(),
        };

        match timeline_json(cursor.engine(), cursor.played()) {
            Ok(json) => json,
            Err(e) => format!("error: {e}"),
        }
    }
}

/// Command names of the two step controls of a cursor.
#[derive(Clone, Copy)]
struct StepControls {
    back: &'static str,
    forward: &'static str,
}

const OPENING_STEPS: StepControls = StepControls {
    back: "prev",
    forward: "next",
};

const BOARD_STEPS: StepControls = StepControls {
    back: "back",
    forward: "forward",
};

fn render_cursor<E: PositionEngine>(cursor: &MoveCursor<E>, steps: StepControls) -> String {
    let control = |name: &str, enabled: bool| {
        if enabled {
            name.to_string()
        } else {
            format!("({name} disabled)")
        }
    };

    let mut out = cursor.render();
    let _ = write!(
        out,
        "\nMove: {} / {}\nFEN: {}\nSteps: {} {}",
        cursor.index(),
        cursor.len(),
        cursor.fen(),
        control(steps.back, cursor.can_step_backward()),
        control(steps.forward, cursor.can_step_forward())
    );
    if !cursor.played().is_empty() {
        let _ = write!(out, "\nPlayed: {}", format_movetext(cursor.played()));
    }
    out
}
