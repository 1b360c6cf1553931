//! `{variable}` placeholders in authored text.
//!
//! A placeholder is `{`, one or more of `[A-Za-z0-9 _.]`, then `}`. Its
//! name is trimmed and lowercased. Anything else, including a lone `{`,
//! is literal text. Values are supplied by the session.

/// A piece of authored text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Var(String),
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.')
}

/// Split text into literal runs and placeholders.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while let Some(offset) = text[i..].find('{') {
        let open = i + offset;
        let body = &text[open + 1..];
        let len = body.find(|c: char| !is_var_char(c)).unwrap_or(body.len());
        if len > 0 && body[len..].starts_with('}') {
            if start < open {
                out.push(Segment::Text(&text[start..open]));
            }
            out.push(Segment::Var(body[..len].trim().to_lowercase()));
            i = open + len + 2;
            start = i;
        } else {
            i = open + 1;
        }
    }
    if start < text.len() {
        out.push(Segment::Text(&text[start..]));
    }
    out
}
