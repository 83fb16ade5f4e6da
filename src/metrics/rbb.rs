//! Reality/Believability Balance: factual anchors weighed against hedges.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{LooposError, Result};

pub const HEDGE_WORDS: &[&str] = &[
    "might",
    "maybe",
    "perhaps",
    "possibly",
    "seems",
    "likely",
    "could",
    "around",
    "approximately",
];

pub const FACTUAL_ANCHORS: &[&str] = &[
    "according",
    "reported",
    "source",
    "data",
    "evidence",
    "study",
    "dataset",
    "record",
    "wikipedia",
];

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z']+").expect("valid word pattern"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RbbScore {
    pub hedge_count: usize,
    pub anchor_count: usize,
    pub token_count: usize,
    /// Higher is better; `(anchors - hedges) / tokens`.
    pub score: f64,
}

impl RbbScore {
    /// Anchors at least offset hedges.
    pub fn calibrated(&self) -> bool {
        self.score >= 0.0
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn compute_rbb(text: &str) -> Result<RbbScore> {
    if text.trim().is_empty() {
        return Err(LooposError::InvalidInput(
            "Text cannot be empty for RBB computation".to_string(),
        ));
    }

    let tokens = tokenize(text);
    let hedge_count = tokens.iter().filter(|t| HEDGE_WORDS.contains(&t.as_str())).count();
    let anchor_count = tokens.iter().filter(|t| FACTUAL_ANCHORS.contains(&t.as_str())).count();
    let token_count = tokens.len().max(1);
    let score = (anchor_count as f64 - hedge_count as f64) / token_count as f64;

    Ok(RbbScore {
        hedge_count,
        anchor_count,
        token_count,
        score,
    })
}
