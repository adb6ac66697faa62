//! Whitespace measurement and normalization helpers.
//!
//! Only ASCII HTML whitespace (space, tab, CR, LF, form feed) is treated as
//! collapsible; a non-breaking space is content.

/// Which end of a span to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Start,
    End,
}

/// Size of a leading or trailing whitespace run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WhitespaceStats {
    /// Run length in bytes.
    pub length: usize,
    /// Line feeds inside the run.
    pub newlines: usize,
}

/// Check if a character is HTML whitespace
pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

/// Measure the whitespace run at one end of `s`.
pub fn whitespace_stats(s: &str, position: Position) -> WhitespaceStats {
    let run = match position {
        Position::Start => &s[..s.len() - s.trim_start_matches(is_html_whitespace).len()],
        Position::End => &s[s.trim_end_matches(is_html_whitespace).len()..],
    };
    WhitespaceStats {
        length: run.len(),
        newlines: run.bytes().filter(|&b| b == b'\n').count(),
    }
}

/// True when `s` holds no visible characters.
pub fn is_whitespace_only(s: &str) -> bool {
    s.chars().all(is_html_whitespace)
}

/// Strip leading and trailing line breaks only.
pub fn trim_newlines(s: &str) -> &str {
    s.trim_matches(|c: char| c == '\n' || c == '\r')
}

/// Drop spaces and tabs at the end of `s`, leaving line breaks alone and
/// never cutting below byte offset `floor`.
pub fn trim_trailing_spaces(s: &mut String, floor: usize) {
    let kept = s.trim_end_matches([' ', '\t']).len().max(floor);
    if kept < s.len() {
        s.truncate(kept);
    }
}

/// Collapse whitespace in text
pub fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_whitespace = false;

    for c in s.chars() {
        if is_html_whitespace(c) {
            if !prev_was_whitespace {
                result.push(' ');
                prev_was_whitespace = true;
            }
        } else {
            result.push(c);
            prev_was_whitespace = false;
        }
    }

    result
}

/// Wrap `content` in `delimiter`, keeping edge whitespace outside the
/// delimiters so `<b> bold </b>` renders as ` **bold** `.
pub fn surround(content: &str, delimiter: &str) -> String {
    let trimmed = content.trim_matches(is_html_whitespace);
    let lead = &content[..content.len() - content.trim_start_matches(is_html_whitespace).len()];
    let trail = &content[content.trim_end_matches(is_html_whitespace).len()..];
    format!("{lead}{delimiter}{trimmed}{delimiter}{trail}")
}

/// Indent every non-empty line after the first by `width` spaces.
pub fn indent_continuation(content: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    let mut out = String::with_capacity(content.len());
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.trim().is_empty() {
                out.push_str(&pad);
            }
        }
        out.push_str(line);
    }
    out
}

/// Drop whole lines at the start of `s` that hold only whitespace.
pub fn trim_leading_blank_lines(s: &str) -> &str {
    let mut rest = s;
    while let Some(idx) = rest.find('\n') {
        if !is_whitespace_only(&rest[..idx]) {
            break;
        }
        rest = &rest[idx + 1..];
    }
    rest
}

/// Cap runs of line breaks at `max`, i.e. at most `max - 1` blank lines in a
/// row. Values below 1 behave as 1. Lines holding only spaces count as blank;
/// those within the cap are kept as they are.
pub fn limit_newlines(s: &str, max: usize) -> String {
    let allowed = max.max(1) - 1;
    let mut kept = Vec::new();
    let mut blank = 0;
    for line in s.split('\n') {
        if line.trim_matches([' ', '\t', '\r']).is_empty() {
            blank += 1;
            if blank > allowed {
                continue;
            }
        } else {
            blank = 0;
        }
        kept.push(line);
    }
    kept.join("\n")
}
