//! Command text handling.
//!
//! Player input and authored commands go through the same normalization:
//! case-fold, split on whitespace, drop control characters, then drop any
//! token the caller's scope ignores. Normalized commands are tokens joined
//! by single spaces.

use crate::crypto::command_key;
use crate::types::Key;

/// Split raw text into normalized tokens.
///
/// `ignored` is consulted per token; in practice it walks the current
/// location's ancestor chain.
pub fn tokenize<F>(input: &str, ignored: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    input
        .split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|c| !c.is_control())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|token| !token.is_empty() && !ignored(token))
        .collect()
}

/// Join tokens into a command string.
pub fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(token.as_ref());
    }
    out
}

/// Tokenize and re-join.
pub fn normalize<F>(input: &str, ignored: F) -> String
where
    F: Fn(&str) -> bool,
{
    join(&tokenize(input, ignored))
}

/// Synthetic commands fired by the engine when a location is entered.
///
/// Their command strings contain a control character, which [`tokenize`]
/// strips from player input, so they cannot be typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Fired on every entry, after the visit hook.
    Forced,
    /// Fired on the first entry only.
    FirstVisit,
    /// Fired on every entry after the first.
    ReturnVisit,
}

impl Hook {
    /// The reserved command string.
    pub const fn command(self) -> &'static str {
        match self {
            Hook::Forced => "\u{1}forced",
            Hook::FirstVisit => "\u{1}first-visit",
            Hook::ReturnVisit => "\u{1}return-visit",
        }
    }

    /// The command key the hook's action slots are sealed under.
    pub fn key(self) -> Key {
        command_key(self.command())
    }
}

fn is_filename_char(c: char, allow_slash: bool) -> bool {
    if c.is_control() {
        return false;
    }
    match c {
        '*' | '<' | '>' | '"' | ':' | ';' | '?' | '|' | '\\' => false,
        '/' => allow_slash,
        _ => true,
    }
}

/// Whether a player-chosen save name is acceptable as-is.
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && name.chars().all(|c| is_filename_char(c, false))
}

/// Strip characters that are unsafe in a file name.
///
/// With `allow_slash`, the result is a relative path: empty, `.` and `..`
/// components are removed so it cannot escape the directory it is joined to.
pub fn clean_filename(name: &str, allow_slash: bool) -> String {
    let kept: String = name.chars().filter(|&c| is_filename_char(c, allow_slash)).collect();
    if !allow_slash {
        return kept;
    }
    kept.split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<Vec<_>>()
        .join("/")
}
