//! Semantic density (TOFU): filler words per detected entity.
//!
//! A lower `density_ratio` means denser, more information-rich text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{LooposError, Result};

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "so", "to", "of", "for", "in", "on", "with", "at", "from", "by",
    "about", "as", "into", "like", "through", "after", "over", "between", "out", "against", "during",
    "without", "before", "under", "around", "among", "just", "very", "really", "actually", "basically",
    "literally", "simply", "kind", "sort", "maybe", "perhaps",
];

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9']+").expect("regex for tofu tokens"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TofuScore {
    pub fluff_tokens: Vec<String>,
    pub entity_tokens: Vec<String>,
    pub total_tokens: usize,
    /// Fluff-to-entity ratio; lower is better.
    pub density_ratio: f64,
}

impl TofuScore {
    pub fn has_signal(&self) -> bool {
        self.total_tokens > 0 && !self.entity_tokens.is_empty()
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// At least one cased character, and every cased character uppercase.
fn is_all_upper(token: &str) -> bool {
    let mut cased = token.chars().filter(|c| c.is_lowercase() || c.is_uppercase()).peekable();
    cased.peek().is_some() && cased.all(char::is_uppercase)
}

fn is_entity(index: usize, token: &str, stopwords: &HashSet<String>) -> bool {
    if stopwords.contains(&token.to_lowercase()) {
        return false;
    }
    let looks_numeric = token.chars().any(|c| c.is_ascii_digit());
    let looks_title = token.chars().next().is_some_and(char::is_uppercase) && (index != 0 || token.chars().count() > 1);
    let is_acronym = is_all_upper(token) && token.chars().count() > 1;
    looks_title || looks_numeric || is_acronym
}

/// Compute the TOFU score of `text`.
///
/// A non-empty `stopwords` list replaces the default filler set.
pub fn compute_tofu(text: &str, stopwords: Option<&[&str]>) -> Result<TofuScore> {
    if text.trim().is_empty() {
        return Err(LooposError::InvalidInput("Input text must not be empty".to_string()));
    }

    let stopwords: HashSet<String> = match stopwords {
        Some(custom) if !custom.is_empty() => custom.iter().map(|w| w.to_lowercase()).collect(),
        _ => DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
    };

    let tokens = tokenize(text);
    let fluff_tokens: Vec<String> = tokens
        .iter()
        .filter(|t| stopwords.contains(&t.to_lowercase()))
        .map(|t| t.to_string())
        .collect();
    let entity_tokens: Vec<String> = tokens
        .iter()
        .enumerate()
        .filter(|(index, t)| is_entity(*index, t, &stopwords))
        .map(|(_, t)| t.to_string())
        .collect();

    let entity_count = entity_tokens.len().max(1);
    let density_ratio = fluff_tokens.len() as f64 / entity_count as f64;

    Ok(TofuScore {
        fluff_tokens,
        entity_tokens,
        total_tokens: tokens.len(),
        density_ratio,
    })
}
