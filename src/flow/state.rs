//! The record threaded through the verification loop.
//!
//! `LoopState` is immutable: every step derives a successor with `with_*`
//! instead of editing the previous record.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Progress markers for a single run, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStage {
    /// Only the prompt is set.
    Created,
    /// Generation step has run.
    Generated,
    /// Verification step has run.
    Verified,
    /// Critique step has run.
    Critiqued,
    /// Refinement step has run.
    Refined,
    /// Final output has been derived.
    Finalized,
}

impl LoopStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Generated => "generated",
            Self::Verified => "verified",
            Self::Critiqued => "critiqued",
            Self::Refined => "refined",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for LoopStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State passed through the loop steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopState {
    prompt: String,
    generation: Option<String>,
    verification: Option<String>,
    critique: Option<String>,
    refinement: Option<String>,
    final_output: Option<String>,
}

/// Treat empty strings the same as unset fields.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

impl LoopState {
    /// Create the initial state of a run with only the prompt set.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            generation: None,
            verification: None,
            critique: None,
            refinement: None,
            final_output: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn generation(&self) -> Option<&str> {
        present(&self.generation)
    }

    pub fn verification(&self) -> Option<&str> {
        present(&self.verification)
    }

    pub fn critique(&self) -> Option<&str> {
        present(&self.critique)
    }

    pub fn refinement(&self) -> Option<&str> {
        present(&self.refinement)
    }

    /// The canonical answer of a finished run.
    pub fn final_output(&self) -> Option<&str> {
        present(&self.final_output)
    }

    pub fn with_generation(&self, generation: impl Into<String>) -> Self {
        Self {
            generation: Some(generation.into()),
            ..self.clone()
        }
    }

    pub fn with_verification(&self, verification: impl Into<String>) -> Self {
        Self {
            verification: Some(verification.into()),
            ..self.clone()
        }
    }

    pub fn with_critique(&self, critique: impl Into<String>) -> Self {
        Self {
            critique: Some(critique.into()),
            ..self.clone()
        }
    }

    pub fn with_refinement(&self, refinement: impl Into<String>) -> Self {
        Self {
            refinement: Some(refinement.into()),
            ..self.clone()
        }
    }

    /// Derive a successor with the final output set (or cleared when `None`).
    pub fn with_final_output(&self, final_output: Option<String>) -> Self {
        Self {
            final_output,
            ..self.clone()
        }
    }

    /// Furthest stage this record has reached.
    pub fn stage(&self) -> LoopStage {
        if self.final_output.is_some() {
            LoopStage::Finalized
        } else if self.refinement.is_some() {
            LoopStage::Refined
        } else if self.critique.is_some() {
            LoopStage::Critiqued
        } else if self.verification.is_some() {
            LoopStage::Verified
        } else if self.generation.is_some() {
            LoopStage::Generated
        } else {
            LoopStage::Created
        }
    }

    /// Short content hash of the record, stable across runs.
    ///
    /// Format: first 8 bytes of SHA-256 over the JSON encoding, as hex.
    pub fn fingerprint(&self) -> Result<String> {
        let encoded = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&encoded);
        let result = hasher.finalize();
        Ok(hex::encode(&result[..8]))
    }
}
