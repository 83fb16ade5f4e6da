//! Text-quality scoring utilities.
//!
//! Independent of the loop controller; each function validates its own
//! input and fails fast on violations:
//!
//! - **ECE** - expected calibration error of probability/label pairs
//! - **RBB** - factual anchors weighed against hedge words
//! - **TOFU** - filler words per detected entity

mod ece;
mod rbb;
mod tofu;

pub use ece::{
    CalibrationBin, CalibrationInput, CalibrationReport, DEFAULT_BINS, batch_ece, calibration_report,
    expected_calibration_error,
};
pub use rbb::{FACTUAL_ANCHORS, HEDGE_WORDS, RbbScore, compute_rbb};
pub use tofu::{DEFAULT_STOPWORDS, TofuScore, compute_tofu};
