//! # Server output-line parsing.
//!
//! Every line the server prints is matched against three patterns sharing
//! the `[HH:MM:SS] [Server thread/INFO]:` prefix:
//!
//! - the **ready signal** (`Done (12.345s)! For help, type "help" or "?"`),
//!   meaningful only while the server is starting;
//! - a **join** line capturing the player name;
//! - a **leave** line capturing the player name.
//!
//! Player names may be wrapped in `§x` formatting codes; these are stripped
//! from the capture.

use std::sync::OnceLock;

use regex::Regex;

const PREFIX: &str = r"^\[..:..:..\] \[Server thread/INFO\]: ";

fn ready_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r#"{PREFIX}Done \(.*s\)! For help, type "help" or "\?"$"#
        ))
        .unwrap()
    })
}

fn join_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"{PREFIX}(?:§.)?(?P<name>.*?)(?:§.)? joined the game$"
        ))
        .unwrap()
    })
}

fn leave_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"{PREFIX}(?:§.)?(?P<name>.*?)(?:§.)? left the game$"
        ))
        .unwrap()
    })
}

/// Semantic event extracted from one server output line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    /// The server finished initializing.
    Ready,
    /// A player joined; carries the captured name.
    Joined(String),
    /// A player left; carries the captured name.
    Left(String),
}

/// Matches one output line against the known patterns.
///
/// Returns `None` for lines without semantic meaning; callers forward every
/// line verbatim regardless.
pub fn parse_line(line: &str) -> Option<OutputEvent> {
    if ready_re().is_match(line) {
        return Some(OutputEvent::Ready);
    }
    if let Some(caps) = join_re().captures(line) {
        return Some(OutputEvent::Joined(caps["name"].to_string()));
    }
    if let Some(caps) = leave_re().captures(line) {
        return Some(OutputEvent::Left(caps["name"].to_string()));
    }
    None
}
