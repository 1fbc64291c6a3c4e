//! Tokenization of raw source text.

use std::collections::HashMap;

/// Occurrence count per token for a single document.
pub type TokenCounts = HashMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Letter,
    Number,
    Space,
    Symbol,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if ch.is_alphabetic() {
            CharClass::Letter
        } else if ch.is_numeric() {
            CharClass::Number
        } else if ch.is_whitespace() {
            CharClass::Space
        } else {
            CharClass::Symbol
        }
    }
}

/// Count the tokens in a document.
///
/// Three kinds of tokens are produced:
///
/// - Heterogeneous tokens: whitespace separated fields that mix character classes,
///   such as `foo(bar)` or `x1`.
/// - Homogeneous tokens: maximal runs of a single character class (letters,
///   numbers or symbols), such as `foo`, `(` or `123`.
/// - Line boundary tokens: the first homogeneous and heterogeneous sub-token of each
///   line prefixed with `"\n"`, and the last ones suffixed with `"\n"`.
///
/// A field is never counted as both heterogeneous and homogeneous. Line boundary
/// tokens are counted in addition to their plain counterparts.
pub fn count_tokens(contents: &str) -> TokenCounts {
    let mut counts = TokenCounts::new();
    let mut bump = |token: String| *counts.entry(token).or_insert(0) += 1;

    for token in heterogeneous_tokens(contents) {
        bump(token.to_string());
    }
    for token in homogeneous_tokens(contents) {
        bump(token.to_string());
    }
    for token in line_boundary_tokens(contents) {
        bump(token);
    }
    counts
}

fn is_homogeneous(field: &str) -> bool {
    let mut classes = field.chars().map(CharClass::of);
    match classes.next() {
        Some(first) => classes.all(|c| c == first),
        None => true,
    }
}

fn heterogeneous_tokens(contents: &str) -> impl Iterator<Item = &str> {
    contents.split_whitespace().filter(|f| !is_homogeneous(f))
}

fn homogeneous_tokens(contents: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut last_class = CharClass::Space;

    for (idx, ch) in contents.char_indices() {
        let class = CharClass::of(ch);
        if class == last_class {
            continue;
        }
        if last_class != CharClass::Space && idx > start {
            tokens.push(&contents[start..idx]);
        }
        start = idx;
        last_class = class;
    }
    if last_class != CharClass::Space && contents.len() > start {
        tokens.push(&contents[start..]);
    }
    tokens
}

fn line_boundary_tokens(contents: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for line in contents.split('\n') {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (Some(first), Some(last)) = (fields.first(), fields.last()) else {
            continue;
        };

        for sub_tokens in [homogeneous_tokens(first), heterogeneous_tokens(first).collect()] {
            if let Some(token) = sub_tokens.first() {
                tokens.push(format!("\n{token}"));
            }
        }
        for sub_tokens in [homogeneous_tokens(last), heterogeneous_tokens(last).collect()] {
            if let Some(token) = sub_tokens.last() {
                tokens.push(format!("{token}\n"));
            }
        }
    }
    tokens
}
