//! Lexical analysis of a single shell input line.
//!
//! A token is a maximal run built from non-whitespace, non-quote characters and
//! double-quoted spans. One leading and one trailing `"` are stripped from each
//! token; there is no escaping beyond that.

use regex::Regex;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:[^\s"]+|"[^"]*")+"#).expect("token pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Collapse every run of whitespace into a single space and trim both ends.
pub fn normalize(line: &str) -> String {
    WHITESPACE.replace_all(line.trim(), " ").into_owned()
}

/// Split a line into tokens, honoring double-quoted spans.
///
/// An unterminated quote is not an error: the stray `"` simply belongs to no
/// token.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    TOKEN
        .find_iter(line)
        .map(|m| strip_quotes(m.as_str()).to_string())
        .collect()
}

fn strip_quotes(word: &str) -> &str {
    let word = word.strip_prefix('"').unwrap_or(word);
    word.strip_suffix('"').unwrap_or(word)
}
