//! Whitespace normalization and length capping

use regex::Regex;
use std::sync::OnceLock;

fn newline_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid regex"))
}

/// Normalize whitespace and cap the length of extracted text
///
/// Runs of three or more newlines become two, then any run of two or more
/// whitespace characters becomes a single space, then the result is trimmed
/// and cut to at most `max_len` characters.
pub fn normalize_text(text: &str, max_len: usize) -> String {
    let text = newline_runs().replace_all(text, "\n\n");
    let text = whitespace_runs().replace_all(&text, " ");
    truncate_chars(text.trim(), max_len).to_string()
}

/// Cut a string to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
