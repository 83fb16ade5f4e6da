//! Audit record for a finished run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::graph::LoopConfig;
use super::state::{LoopStage, LoopState};
use crate::error::Result;

/// Terminal state of a run plus the trace that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Configuration the run used.
    pub config: LoopConfig,
    /// Names of the steps that executed, in order.
    pub steps: Vec<String>,
    /// Stages traversed, from `created` to `finalized`.
    pub stages: Vec<LoopStage>,
    /// Content hash of `state`.
    pub fingerprint: String,
    /// Terminal state with `final_output` derived.
    pub state: LoopState,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    /// Whether the run produced a canonical answer.
    pub fn has_final_output(&self) -> bool {
        self.state.final_output().is_some()
    }

    /// Pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
