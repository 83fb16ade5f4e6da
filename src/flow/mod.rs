//! Verification loop.
//!
//! A run threads an immutable [`LoopState`] through a prefix of one of two
//! step sequences:
//!
//! 1. **Generation** - draft an answer from the prompt
//! 2. **Verification** - check the draft covers the prompt's keywords
//! 3. **Critique** - judge the verification outcome (deep mode only)
//! 4. **Refinement** - synthesize the final block (deep mode only)
//!
//! `loop_depth` decides how long the prefix is; `deep_mode` decides which
//! sequence it is taken from and where the final output comes from.

mod graph;
mod report;
mod state;
mod steps;

pub use graph::{
    DEFAULT_LOOP_DEPTH, LoopConfig, LoopGraph, MAX_LOOP_DEPTH, MIN_DEEP_DEPTH, MIN_LOOP_DEPTH,
};
pub use report::RunReport;
pub use state::{LoopStage, LoopState};
pub use steps::{
    CRITIQUE_GAPS, CRITIQUE_PASS, FULLY_VERIFIED, GENERATION_MISSING, NO_PROMPT, NOTHING_TO_REFINE,
    Step, StepHandler, StepKind, StepRegistry, VERIFICATION_SKIPPED, critique_step, generation_step,
    refinement_step, verification_step,
};
