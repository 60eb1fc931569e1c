use std::fmt::Write;
use std::io;
use std::mem;
use std::ops::ControlFlow;

use pgn_reader::{Nag, Outcome, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use smallvec::SmallVec;

use super::error::CodecError;
use super::moves::{RESULT_MARKERS, strip_move_number};
use super::types::GameTags;

pub type MoveList = SmallVec<[String; 128]>;

const LINE_WIDTH: usize = 80;

/// Header values of a decoded game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameHeaders {
    pub event: Option<String>,
    pub site: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    /// Termination marker from the movetext, falling back to the `Result` tag.
    pub outcome: Option<String>,
}

impl GameHeaders {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the Event, Site, White and Black tags with the values this
    /// game carries. Date, Round and Result are left alone.
    pub fn apply_to(&self, tags: &mut GameTags) {
        let pairs = [
            (&self.event, &mut tags.event),
            (&self.site, &mut tags.site),
            (&self.white, &mut tags.white),
            (&self.black, &mut tags.black),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
    }

    /// One-line description such as `Casual, Alice vs Bob, result 1-0`.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(event) = &self.event {
            parts.push(event.clone());
        }
        if self.white.is_some() || self.black.is_some() {
            parts.push(format!(
                "{} vs {}",
                self.white.as_deref().unwrap_or("?"),
                self.black.as_deref().unwrap_or("?")
            ));
        }
        if let Some(site) = &self.site {
            parts.push(site.clone());
        }
        if let Some(outcome) = self.outcome.as_deref().filter(|o| *o != "*") {
            parts.push(format!("result {outcome}"));
        }

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// Mainline of one decoded game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedGame {
    pub moves: MoveList,
    pub headers: GameHeaders,
}

/// Decode the first game in `text`. Comments, NAGs and variations are
/// skipped; only the mainline SAN tokens are kept.
///
/// Every mainline token must be well-formed SAN: the first one that is not
/// fails the whole game with [`CodecError::UnparsableMove`]. A game without
/// any moves is [`CodecError::NoGame`]. Legality is not checked here.
pub fn parse_game(text: &str) -> Result<ParsedGame, CodecError> {
    if text.trim().is_empty() {
        return Err(CodecError::NoGame);
    }

    let moves = scan_mainline(text)?;
    if moves.is_empty() {
        return Err(CodecError::NoGame);
    }

    let mut reader = Reader::new(io::Cursor::new(text.as_bytes()));
    let mut visitor = HeaderVisitor::default();

    match reader.read_game(&mut visitor) {
        Ok(Some(())) => Ok(ParsedGame {
            moves,
            headers: visitor.finish(),
        }),
        Ok(None) => Err(CodecError::NoGame),
        Err(e) => Err(CodecError::Malformed(e.to_string())),
    }
}

/// Walk the movetext of the first game and parse each mainline token as SAN.
///
/// Tag pairs, `{}` and `;` comments, `%` escape lines, variations, NAGs,
/// move numbers and trailing `!`/`?` glyphs are skipped. A result marker, or
/// a tag pair after the first move, ends the game.
fn scan_mainline(text: &str) -> Result<MoveList, CodecError> {
    let mut scanner = MovetextScanner::default();
    let mut chars = text.chars();
    let mut line_start = true;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                scanner.flush()?;
                chars.by_ref().take_while(|&c| c != '}').for_each(drop);
            }
            ';' => {
                scanner.flush()?;
                chars.by_ref().take_while(|&c| c != '\n').for_each(drop);
                line_start = true;
                continue;
            }
            '%' if line_start => {
                chars.by_ref().take_while(|&c| c != '\n').for_each(drop);
                continue;
            }
            '[' if scanner.depth == 0 => {
                scanner.flush()?;
                if !scanner.sans.is_empty() {
                    break;
                }
                skip_tag_pair(&mut chars);
            }
            '(' => {
                scanner.flush()?;
                scanner.depth += 1;
            }
            ')' => {
                scanner.flush()?;
                scanner.depth = scanner.depth.saturating_sub(1);
            }
            c if c.is_whitespace() => scanner.flush()?,
            c => scanner.token.push(c),
        }

        if scanner.finished {
            break;
        }
        line_start = c == '\n';
    }

    scanner.flush()?;
    Ok(scanner.sans)
}

fn skip_tag_pair(chars: &mut std::str::Chars<'_>) {
    let mut quoted = false;
    let mut escaped = false;
    for c in chars {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ']' if !quoted => return,
            _ => {}
        }
    }
}

#[derive(Default)]
struct MovetextScanner {
    sans: MoveList,
    token: String,
    depth: usize,
    finished: bool,
}

impl MovetextScanner {
    fn flush(&mut self) -> Result<(), CodecError> {
        let raw = mem::take(&mut self.token);
        if raw.is_empty() || self.depth > 0 || self.finished {
            return Ok(());
        }
        if RESULT_MARKERS.contains(&raw.as_str()) {
            self.finished = true;
            return Ok(());
        }
        if raw.starts_with('$') {
            return Ok(());
        }

        let notation = strip_move_number(&raw).trim_end_matches(['!', '?']);
        if notation.is_empty() {
            return Ok(());
        }

        let san: SanPlus = notation.parse().map_err(|_| CodecError::UnparsableMove {
            ply: self.sans.len() + 1,
            notation: notation.to_string(),
        })?;
        self.sans.push(san.to_string());
        Ok(())
    }
}

/// Numbered movetext (`1. e4 e5 2. Nf3`) for a line played from the start.
pub fn format_movetext<S: AsRef<str>>(moves: &[S]) -> String {
    let mut out = String::new();
    for (ply, san) in moves.iter().enumerate() {
        if !out.is_empty() {
            out.push(' ');
        }
        if ply % 2 == 0 {
            let _ = write!(out, "{}. ", (ply / 2) + 1);
        }
        out.push_str(san.as_ref());
    }
    out
}

/// Render a complete PGN game: the seven tag roster, a blank line, then
/// movetext wrapped at 80 columns and terminated by the result marker.
pub fn serialize_game<S: AsRef<str>>(moves: &[S], tags: &GameTags) -> String {
    let date = tags.pgn_date();
    let roster: [(&str, &str); 7] = [
        ("Event", &tags.event),
        ("Site", &tags.site),
        ("Date", &date),
        ("Round", &tags.round),
        ("White", &tags.white),
        ("Black", &tags.black),
        ("Result", &tags.result),
    ];

    let mut out = String::with_capacity(256);
    for (key, value) in roster {
        let _ = writeln!(out, "[{} \"{}\"]", key, escape_tag_value(value));
    }
    out.push('\n');

    let mut movetext = format_movetext(moves);
    if !movetext.is_empty() {
        movetext.push(' ');
    }
    movetext.push_str(&tags.result);

    out.push_str(&wrap_words(&movetext, LINE_WIDTH));
    out.push('\n');
    out
}

fn escape_tag_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn wrap_words(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut line_len = 0;
    for word in text.split_whitespace() {
        if line_len > 0 && line_len + 1 + word.len() > width {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        out.push_str(word);
        line_len += word.len();
    }
    out
}

#[derive(Default)]
struct TagFields {
    event: String,
    site: String,
    white: String,
    black: String,
    result: String,
}

impl TagFields {
    fn opt_take(field: &mut String) -> Option<String> {
        if field.is_empty() {
            None
        } else {
            Some(mem::take(field))
        }
    }

    fn set_known_tag(&mut self, key: &[u8], value: RawTag<'_>) {
        let slot: &mut String = match key {
            b"Event" => &mut self.event,
            b"Site" => &mut self.site,
            b"White" => &mut self.white,
            b"Black" => &mut self.black,
            b"Result" => &mut self.result,
            _ => return,
        };

        // First occurrence wins.
        if !slot.is_empty() {
            return;
        }

        let bytes = value.as_bytes();
        if bytes.is_empty() {
            return;
        }

        *slot = String::from_utf8_lossy(bytes).into_owned();
    }
}

#[derive(Default)]
struct HeaderVisitor {
    tags: TagFields,
    outcome: Option<String>,
}

impl HeaderVisitor {
    fn finish(&mut self) -> GameHeaders {
        let outcome = self
            .outcome
            .take()
            .or_else(|| TagFields::opt_take(&mut self.tags.result));

        GameHeaders {
            event: TagFields::opt_take(&mut self.tags.event),
            site: TagFields::opt_take(&mut self.tags.site),
            white: TagFields::opt_take(&mut self.tags.white),
            black: TagFields::opt_take(&mut self.tags.black),
            outcome,
        }
    }
}

impl Visitor for HeaderVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.tags = TagFields::default();
        self.outcome = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        self.tags.set_known_tag(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(&mut self, _: &mut Self::Movetext, _: SanPlus) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn nag(&mut self, _: &mut Self::Movetext, _: Nag) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn comment(&mut self, _: &mut Self::Movetext, _: RawComment<'_>) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        _: &mut Self::Movetext,
        _: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.outcome = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {}
}
