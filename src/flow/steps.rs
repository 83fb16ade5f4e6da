//! Step catalogue for the verification loop.
//!
//! Each step is a pure transformation over `LoopState`. Steps are grouped
//! into two ordered sequences: shallow (generation, verification) and deep
//! (shallow followed by critique, refinement).

use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use super::state::{LoopStage, LoopState};

pub const NO_PROMPT: &str = "No prompt provided.";
pub const GENERATION_MISSING: &str = "Generation missing.";
pub const FULLY_VERIFIED: &str = "All prompt entities verified in response.";
pub const MISSING_MARKER: &str = "Missing";
pub const VERIFICATION_SKIPPED: &str = "Verification skipped.";
pub const CRITIQUE_GAPS: &str = "CRITICAL: Response density low. Fact gaps detected.";
pub const CRITIQUE_PASS: &str = "PASS: Logic flow is sound. Optimize for concision.";
pub const NOTHING_TO_REFINE: &str = "No generation to refine.";

/// The four loop steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKind {
    /// Step 1: draft an answer from the prompt
    Generation = 1,
    /// Step 2: check the draft covers the prompt
    Verification = 2,
    /// Step 3: judge the verification outcome
    Critique = 3,
    /// Step 4: synthesize the final block
    Refinement = 4,
}

impl StepKind {
    /// Get the step from a 1-indexed number.
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::Generation),
            2 => Some(Self::Verification),
            3 => Some(Self::Critique),
            4 => Some(Self::Refinement),
            _ => None,
        }
    }

    /// Get the 1-indexed number for this step.
    pub fn number(&self) -> u32 {
        *self as u32
    }

    /// Identifier used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Verification => "verification",
            Self::Critique => "critique",
            Self::Refinement => "refinement",
        }
    }

    /// Get the next step, if any.
    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Stage a state reaches once this step has run.
    pub fn stage(&self) -> LoopStage {
        match self {
            Self::Generation => LoopStage::Generated,
            Self::Verification => LoopStage::Verified,
            Self::Critique => LoopStage::Critiqued,
            Self::Refinement => LoopStage::Refined,
        }
    }

    fn handler(&self) -> StepHandler {
        match self {
            Self::Generation => generation_step,
            Self::Verification => verification_step,
            Self::Critique => critique_step,
            Self::Refinement => refinement_step,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.name())
    }
}

/// Signature shared by all step bodies.
pub type StepHandler = fn(&LoopState) -> LoopState;

/// A named stage of the loop.
#[derive(Clone, Copy)]
pub struct Step {
    kind: StepKind,
    handler: StepHandler,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            handler: kind.handler(),
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Apply the step, producing the successor state.
    pub fn run(&self, state: &LoopState) -> LoopState {
        debug!("Running {} on stage {}", self.kind, state.stage());
        (self.handler)(state)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("kind", &self.kind).finish()
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Step {}

/// The shallow and deep step sequences, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    shallow: Vec<Step>,
    deep: Vec<Step>,
}

impl StepRegistry {
    pub fn new() -> Self {
        let shallow = vec![Step::new(StepKind::Generation), Step::new(StepKind::Verification)];
        let mut deep = shallow.clone();
        // Deep continues from the last shallow step through every later kind
        let tail = std::iter::successors(StepKind::Verification.next(), StepKind::next);
        deep.extend(tail.map(Step::new));
        Self { shallow, deep }
    }

    pub fn shallow(&self) -> &[Step] {
        &self.shallow
    }

    pub fn deep(&self) -> &[Step] {
        &self.deep
    }

    /// Base sequence for the given mode.
    pub fn sequence(&self, deep_mode: bool) -> &[Step] {
        if deep_mode { &self.deep } else { &self.shallow }
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased whitespace-separated words longer than three characters.
fn keywords(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .filter(|token| token.chars().count() > 3)
        .map(|token| token.to_lowercase())
        .collect()
}

pub fn generation_step(state: &LoopState) -> LoopState {
    let summary = state.prompt().trim();
    if summary.is_empty() {
        state.with_generation(NO_PROMPT)
    } else {
        state.with_generation(format!("Answering: {}", summary))
    }
}

/// Keyword-coverage check of the generation against the prompt.
pub fn verification_step(state: &LoopState) -> LoopState {
    let Some(generation) = state.generation() else {
        return state.with_verification(GENERATION_MISSING);
    };

    let response_tokens = keywords(generation);
    let missing: Vec<String> = keywords(state.prompt())
        .into_iter()
        .filter(|token| !response_tokens.contains(token))
        .collect();

    if missing.is_empty() {
        state.with_verification(FULLY_VERIFIED)
    } else {
        state.with_verification(format!(
            "Potential Hallucination: {} coverage for {}",
            MISSING_MARKER,
            missing.join(", ")
        ))
    }
}

pub fn critique_step(state: &LoopState) -> LoopState {
    match state.verification() {
        None => state.with_critique(VERIFICATION_SKIPPED),
        Some(verification) if verification.contains(MISSING_MARKER) => state.with_critique(CRITIQUE_GAPS),
        Some(_) => state.with_critique(CRITIQUE_PASS),
    }
}

/// Four-block synthesis of the upstream fields.
pub fn refinement_step(state: &LoopState) -> LoopState {
    let Some(generation) = state.generation() else {
        return state.with_refinement(NOTHING_TO_REFINE);
    };

    let refinement = format!(
        "--- SECUND OUTPUT BLOCK ---\n\n\
         1. [REALITY] \n   \
         Verified Source: Internal Knowledge Base.\n   \
         Status: {status}\n\n\
         2. [CLARITY] \n   \
         Summary: {generation}\n   \
         Signal-to-Noise: High.\n\n\
         3. [MECHANICS] \n   \
         Logic Path: Generation -> Verification -> Refinement.\n   \
         Critique Note: {critique}\n\n\
         4. [CONTROL] \n   \
         Compliance: EU AI Act Art. 13 Checked.\n   \
         Risk Level: Low.",
        status = state.verification().unwrap_or_default(),
        generation = generation,
        critique = state.critique().unwrap_or_default(),
    );

    state.with_refinement(refinement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_kind_numbers() {
        assert_eq!(StepKind::Generation.number(), 1);
        assert_eq!(StepKind::Refinement.number(), 4);
        assert_eq!(StepKind::from_number(3), Some(StepKind::Critique));
        assert_eq!(StepKind::from_number(0), None);
        assert_eq!(StepKind::from_number(5), None);
    }

    #[test]
    fn test_step_kind_next() {
        assert_eq!(StepKind::Generation.next(), Some(StepKind::Verification));
        assert_eq!(StepKind::Critique.next(), Some(StepKind::Refinement));
        assert_eq!(StepKind::Refinement.next(), None);
    }

    #[test]
    fn test_step_kind_display() {
        assert_eq!(StepKind::Verification.to_string(), "Step 2: verification");
    }

    #[test]
    fn test_registry_sequences() {
        let registry = StepRegistry::new();
        let shallow: Vec<&str> = registry.shallow().iter().map(Step::name).collect();
        let deep: Vec<&str> = registry.deep().iter().map(Step::name).collect();

        assert_eq!(shallow, vec!["generation", "verification"]);
        assert_eq!(deep, vec!["generation", "verification", "critique", "refinement"]);
    }

    #[test]
    fn test_deep_extends_shallow() {
        let registry = StepRegistry::new();
        assert_eq!(&registry.deep()[..2], registry.shallow());
        assert_eq!(registry.sequence(false), registry.shallow());
        assert_eq!(registry.sequence(true), registry.deep());
    }

    #[test]
    fn test_generation_with_prompt() {
        let state = generation_step(&LoopState::new("  Summarize the findings.  "));
        assert_eq!(state.generation(), Some("Answering: Summarize the findings."));
    }

    #[test]
    fn test_generation_blank_prompt() {
        assert_eq!(generation_step(&LoopState::new("")).generation(), Some(NO_PROMPT));
        assert_eq!(generation_step(&LoopState::new(" \t\n")).generation(), Some(NO_PROMPT));
    }

    #[test]
    fn test_generation_ignores_other_fields() {
        let state = LoopState::new("topic").with_verification("stale").with_critique("stale");
        let next = generation_step(&state);
        assert_eq!(next.generation(), Some("Answering: topic"));
        assert_eq!(next.verification(), Some("stale"));
    }

    #[test]
    fn test_verification_without_generation() {
        let state = verification_step(&LoopState::new("anything"));
        assert_eq!(state.verification(), Some(GENERATION_MISSING));
    }

    #[test]
    fn test_verification_full_coverage() {
        let state = generation_step(&LoopState::new("Summarize the findings."));
        let state = verification_step(&state);
        assert_eq!(state.verification(), Some(FULLY_VERIFIED));
    }

    #[test]
    fn test_verification_lists_missing_sorted() {
        let state = LoopState::new("Zebra apple mango tiny")
            .with_generation("something about MANGO");
        let state = verification_step(&state);
        assert_eq!(
            state.verification(),
            Some("Potential Hallucination: Missing coverage for apple, tiny, zebra")
        );
    }

    #[test]
    fn test_verification_short_tokens_ignored() {
        let state = LoopState::new("the cat sat").with_generation("dog");
        assert_eq!(verification_step(&state).verification(), Some(FULLY_VERIFIED));
    }

    #[test]
    fn test_verification_counts_characters_not_bytes() {
        // "été" is three characters but five bytes
        let state = LoopState::new("été café").with_generation("x");
        assert_eq!(
            verification_step(&state).verification(),
            Some("Potential Hallucination: Missing coverage for café")
        );
    }

    #[test]
    fn test_critique_without_verification() {
        let state = critique_step(&LoopState::new("p"));
        assert_eq!(state.critique(), Some(VERIFICATION_SKIPPED));
    }

    #[test]
    fn test_critique_detects_gaps() {
        let state = LoopState::new("p").with_verification("Potential Hallucination: Missing coverage for x");
        assert_eq!(critique_step(&state).critique(), Some(CRITIQUE_GAPS));
    }

    #[test]
    fn test_critique_passes_clean_verification() {
        let state = LoopState::new("p").with_verification(FULLY_VERIFIED);
        assert_eq!(critique_step(&state).critique(), Some(CRITIQUE_PASS));
    }

    #[test]
    fn test_critique_marker_is_case_sensitive() {
        let state = LoopState::new("p").with_verification(GENERATION_MISSING);
        assert_eq!(critique_step(&state).critique(), Some(CRITIQUE_PASS));
    }

    #[test]
    fn test_refinement_without_generation() {
        let state = refinement_step(&LoopState::new("p").with_critique(CRITIQUE_PASS));
        assert_eq!(state.refinement(), Some(NOTHING_TO_REFINE));
    }

    #[test]
    fn test_refinement_combines_generation_and_critique() {
        let state = LoopState::new("p")
            .with_generation("Answering: p")
            .with_verification(FULLY_VERIFIED)
            .with_critique(CRITIQUE_PASS);
        let refinement = refinement_step(&state).refinement().unwrap().to_string();

        assert!(refinement.contains("Summary: Answering: p"));
        assert!(refinement.contains(&format!("Critique Note: {}", CRITIQUE_PASS)));
        assert!(refinement.contains(&format!("Status: {}", FULLY_VERIFIED)));
        assert!(refinement.starts_with("--- SECUND OUTPUT BLOCK ---"));
    }

    #[test]
    fn test_refinement_block_layout() {
        let state = LoopState::new("p")
            .with_generation("Answering: p")
            .with_verification(FULLY_VERIFIED)
            .with_critique(CRITIQUE_PASS);
        let expected = format!(
            "--- SECUND OUTPUT BLOCK ---\n\n\
             1. [REALITY] \n   Verified Source: Internal Knowledge Base.\n   Status: {}\n\n\
             2. [CLARITY] \n   Summary: Answering: p\n   Signal-to-Noise: High.\n\n\
             3. [MECHANICS] \n   Logic Path: Generation -> Verification -> Refinement.\n   Critique Note: {}\n\n\
             4. [CONTROL] \n   Compliance: EU AI Act Art. 13 Checked.\n   Risk Level: Low.",
            FULLY_VERIFIED, CRITIQUE_PASS
        );
        assert_eq!(refinement_step(&state).refinement(), Some(expected.as_str()));
    }

    #[test]
    fn test_refinement_missing_critique_renders_empty() {
        let state = LoopState::new("p").with_generation("Answering: p");
        let refinement = refinement_step(&state).refinement().unwrap().to_string();
        assert!(refinement.contains("Critique Note: \n"));
        assert!(!refinement.contains("None"));
    }

    #[test]
    fn test_step_run_uses_handler() {
        let step = Step::new(StepKind::Generation);
        let state = step.run(&LoopState::new("x"));
        assert_eq!(state.generation(), Some("Answering: x"));
        assert_eq!(step.kind().stage(), state.stage());
    }
}
