//! `**bold**` spans in example sentences.

use regex::Regex;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// A piece of an example sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Plain text.
    Text(&'a str),
    /// Text that was wrapped in `**`.
    Bold(&'a str),
}

/// Splits `text` into plain and bold spans.
///
/// Matching is non-greedy and never crosses a line; a `**` without a
/// partner stays in the plain text.
pub fn parse(text: &str) -> Vec<Span<'_>> {
    let Ok(re) = Regex::new(r"\*\*(.+?)\*\*") else {
        return vec![Span::Text(text)];
    };

    let mut spans = Vec::new();
    let mut last = 0;
    for cap in re.captures_iter(text) {
        let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::Text(&text[last..whole.start()]));
        }
        spans.push(Span::Bold(inner.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        spans.push(Span::Text(&text[last..]));
    }
    spans
}

/// Renders `text` with bold spans as ANSI escapes.
pub fn to_ansi(text: &str) -> String {
    parse(text)
        .into_iter()
        .map(|span| match span {
            Span::Text(t) => t.to_string(),
            Span::Bold(b) => format!("{BOLD}{b}{RESET}"),
        })
        .collect()
}
