//! Markdown escaping for text nodes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that are Markdown syntax anywhere in a line.
static GLOBAL_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\`*_~\[\]]").unwrap());

/// Block markers that only matter at the start of a line: `+ `, `=`, `>`,
/// `-` and ATX heading hashes.
static LINE_START_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)(\+[ \t]|[=>-]|#{1,6}(?:[ \t]|$))").unwrap());

/// `1. ` at line start would open an ordered list.
static ORDERED_LIST_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)(\d+)\.([ \t]|$)").unwrap());

/// Escape markdown special characters in `text`.
///
/// `at_line_start` tells whether the text begins a new output line; when it
/// does not, block markers on its first line are left alone.
pub fn escape_markdown(text: &str, at_line_start: bool) -> String {
    let escaped = GLOBAL_ESCAPE.replace_all(text, r"\$0");

    if at_line_start {
        return escape_line_starts(&escaped);
    }

    match escaped.find('\n') {
        Some(idx) => {
            let (first, rest) = escaped.split_at(idx);
            format!("{first}{}", escape_line_starts(rest))
        }
        None => escaped.into_owned(),
    }
}

fn escape_line_starts(text: &str) -> String {
    let text = LINE_START_ESCAPE.replace_all(text, r"$1\$2");
    ORDERED_LIST_ESCAPE
        .replace_all(&text, r"$1$2\.$3")
        .into_owned()
}

/// Escape unescaped pipes so cell text cannot split a table row.
pub fn escape_table_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '|' && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Count `|` cell separators in a rendered table row, skipping escaped ones.
pub fn count_unescaped_pipes(row: &str) -> usize {
    let mut count = 0;
    let mut prev = None;
    for c in row.chars() {
        if c == '|' && prev != Some('\\') {
            count += 1;
        }
        prev = Some(c);
    }
    count
}
