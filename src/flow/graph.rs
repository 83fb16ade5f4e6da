//! Loop controller: selects a step prefix from the registry, folds the
//! state through it, and derives the final output.

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;

use super::report::RunReport;
use super::state::{LoopStage, LoopState};
use super::steps::{Step, StepRegistry};
use crate::error::{LooposError, Result};

/// Smallest configurable loop depth.
pub const MIN_LOOP_DEPTH: u8 = 1;
/// Largest configurable loop depth.
pub const MAX_LOOP_DEPTH: u8 = 4;
/// Depth deep mode needs before critique can run.
pub const MIN_DEEP_DEPTH: u8 = 3;
/// Default loop depth (generation + verification).
pub const DEFAULT_LOOP_DEPTH: u8 = 2;

/// Per-run behavior selector.
///
/// Only constructible through [`LoopConfig::new`], so every instance has
/// passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopConfig {
    deep_mode: bool,
    loop_depth: u8,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            deep_mode: false,
            loop_depth: DEFAULT_LOOP_DEPTH,
        }
    }
}

impl LoopConfig {
    /// Create a validated configuration.
    pub fn new(deep_mode: bool, loop_depth: u8) -> Result<Self> {
        let config = Self { deep_mode, loop_depth };
        config.validate()?;
        Ok(config)
    }

    /// Check depth bounds and the deep-mode depth requirement.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LOOP_DEPTH..=MAX_LOOP_DEPTH).contains(&self.loop_depth) {
            return Err(LooposError::Config(format!(
                "loop_depth must be between {} and {}, got {}",
                MIN_LOOP_DEPTH, MAX_LOOP_DEPTH, self.loop_depth
            )));
        }
        if self.deep_mode && self.loop_depth < MIN_DEEP_DEPTH {
            return Err(LooposError::Config(format!(
                "deep mode requires loop_depth >= {}, got {}",
                MIN_DEEP_DEPTH, self.loop_depth
            )));
        }
        Ok(())
    }

    pub fn deep_mode(&self) -> bool {
        self.deep_mode
    }

    pub fn loop_depth(&self) -> u8 {
        self.loop_depth
    }

    /// Whether a run with this configuration executes the refinement step.
    ///
    /// Deep runs take their final output from refinement, so a deep run
    /// that stops at depth 3 finishes without one.
    pub fn reaches_refinement(&self) -> bool {
        self.deep_mode && self.loop_depth >= MAX_LOOP_DEPTH
    }
}

/// Runs the verification loop for a fixed configuration.
///
/// The registry is read-only after construction, so a single graph can
/// serve concurrent runs by shared reference.
#[derive(Debug, Clone)]
pub struct LoopGraph {
    config: LoopConfig,
    registry: StepRegistry,
}

impl Default for LoopGraph {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}

impl LoopGraph {
    pub fn new(config: LoopConfig) -> Self {
        if config.deep_mode() && !config.reaches_refinement() {
            warn!(
                "Deep mode with loop_depth {} never reaches refinement; runs will have no final output",
                config.loop_depth()
            );
        }
        Self {
            config,
            registry: StepRegistry::new(),
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Prefix of the mode's sequence this configuration executes.
    ///
    /// `loop_depth` truncates but never extends past the sequence length.
    pub fn selected_steps(&self) -> &[Step] {
        let base = self.registry.sequence(self.config.deep_mode());
        let depth = usize::from(self.config.loop_depth()).min(base.len());
        &base[..depth]
    }

    /// Run the loop over `prompt` and return the finalized state.
    pub fn run(&self, prompt: &str) -> LoopState {
        let steps = self.selected_steps();
        info!(
            "Running loop (deep_mode={}, loop_depth={}, steps={})",
            self.config.deep_mode(),
            self.config.loop_depth(),
            steps.len()
        );

        let state = steps
            .iter()
            .fold(LoopState::new(prompt), |state, step| step.run(&state));

        let final_output = self.derive_final_output(&state);
        debug!("Final output present: {}", final_output.is_some());
        state.with_final_output(final_output)
    }

    /// Run the loop and wrap the result in an audit record.
    pub fn run_report(&self, prompt: &str) -> Result<RunReport> {
        let state = self.run(prompt);
        let steps = self.selected_steps();
        let mut stages = vec![LoopStage::Created];
        stages.extend(steps.iter().map(|step| step.kind().stage()));
        stages.push(LoopStage::Finalized);

        Ok(RunReport {
            config: self.config,
            steps: steps.iter().map(|step| step.name().to_string()).collect(),
            stages,
            fingerprint: state.fingerprint()?,
            state,
            completed_at: Utc::now(),
        })
    }

    fn derive_final_output(&self, state: &LoopState) -> Option<String> {
        let output = if self.config.deep_mode() {
            state.refinement()
        } else {
            state.verification().or(state.generation())
        };
        output.map(str::to_string)
    }
}
