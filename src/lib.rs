//! loopos - a depth-gated verification loop
//!
//! A prompt is escalated through generation, verification, critique and
//! refinement steps according to a validated [`flow::LoopConfig`]. The
//! [`metrics`] module ships three standalone text-quality scores.

pub mod error;
pub mod flow;
pub mod metrics;

pub use error::{LooposError, Result};
