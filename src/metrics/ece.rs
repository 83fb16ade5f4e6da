//! Expected Calibration Error.
//!
//! Probabilities are bucketed into `n_bins` equal-width, right-closed bins
//! over [0, 1]. ECE is the count-weighted mean gap between each bin's
//! average confidence and its observed accuracy.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{LooposError, Result};

/// Default number of calibration bins.
pub const DEFAULT_BINS: usize = 10;

/// Paired probabilities and binary labels to score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationInput {
    pub probabilities: Vec<f64>,
    pub labels: Vec<u8>,
    pub n_bins: usize,
}

impl CalibrationInput {
    pub fn new(probabilities: Vec<f64>, labels: Vec<u8>) -> Self {
        Self {
            probabilities,
            labels,
            n_bins: DEFAULT_BINS,
        }
    }

    pub fn with_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = n_bins;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate(&self.probabilities, &self.labels, self.n_bins)
    }

    pub fn ece(&self) -> Result<f64> {
        expected_calibration_error(&self.probabilities, &self.labels, self.n_bins)
    }
}

/// One bucket of the reliability breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub avg_confidence: f64,
    pub avg_accuracy: f64,
}

impl CalibrationBin {
    pub fn gap(&self) -> f64 {
        (self.avg_accuracy - self.avg_confidence).abs()
    }
}

/// ECE together with the non-empty bins that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub ece: f64,
    pub total: usize,
    pub bins: Vec<CalibrationBin>,
}

fn validate(probabilities: &[f64], labels: &[u8], n_bins: usize) -> Result<()> {
    if probabilities.is_empty() {
        return Err(LooposError::InvalidInput("At least one probability is required".to_string()));
    }
    if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(LooposError::InvalidInput(format!(
            "Probabilities must be between 0 and 1, got {}",
            p
        )));
    }
    if labels.is_empty() {
        return Err(LooposError::InvalidInput("At least one label is required".to_string()));
    }
    if let Some(label) = labels.iter().find(|label| **label > 1) {
        return Err(LooposError::InvalidInput(format!(
            "Labels must be 0 or 1, got {}",
            label
        )));
    }
    if probabilities.len() != labels.len() {
        return Err(LooposError::InvalidInput(format!(
            "Probabilities and labels must have the same length ({} != {})",
            probabilities.len(),
            labels.len()
        )));
    }
    if n_bins == 0 {
        return Err(LooposError::InvalidInput("n_bins must be at least 1".to_string()));
    }
    Ok(())
}

/// Bin index for `p`: the number of interior edges `k * width` strictly
/// below it.
///
/// Starts from the arithmetic estimate and walks it onto the exact edge
/// comparison, so the result does not depend on `n_bins` scans.
fn bin_index(p: f64, n_bins: usize) -> usize {
    let last = n_bins - 1;
    let width = 1.0 / n_bins as f64;
    let mut index = ((p * n_bins as f64).ceil() as usize).saturating_sub(1).min(last);
    while index > 0 && index as f64 * width >= p {
        index -= 1;
    }
    while index < last && (index + 1) as f64 * width < p {
        index += 1;
    }
    index
}

/// Per-bin reliability breakdown and the resulting ECE.
pub fn calibration_report(probabilities: &[f64], labels: &[u8], n_bins: usize) -> Result<CalibrationReport> {
    validate(probabilities, labels, n_bins)?;

    let mut sums: BTreeMap<usize, (usize, f64, f64)> = BTreeMap::new();
    for (p, label) in probabilities.iter().zip(labels) {
        let entry = sums.entry(bin_index(*p, n_bins)).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += p;
        entry.2 += f64::from(*label);
    }

    let total = probabilities.len();
    let width = 1.0 / n_bins as f64;
    let bins: Vec<CalibrationBin> = sums
        .into_iter()
        .map(|(index, (count, conf_sum, acc_sum))| CalibrationBin {
            lower: index as f64 * width,
            upper: (index + 1) as f64 * width,
            count,
            avg_confidence: conf_sum / count as f64,
            avg_accuracy: acc_sum / count as f64,
        })
        .collect();

    let ece = bins
        .iter()
        .map(|bin| (bin.count as f64 / total as f64) * bin.gap())
        .sum();

    Ok(CalibrationReport { ece, total, bins })
}

/// Compute Expected Calibration Error.
pub fn expected_calibration_error(probabilities: &[f64], labels: &[u8], n_bins: usize) -> Result<f64> {
    Ok(calibration_report(probabilities, labels, n_bins)?.ece)
}

/// Mean ECE across several calibration batches.
pub fn batch_ece(records: &[CalibrationInput]) -> Result<f64> {
    if records.is_empty() {
        return Err(LooposError::InvalidInput("No calibration records provided".to_string()));
    }
    let values = records
        .iter()
        .map(CalibrationInput::ece)
        .collect::<Result<Vec<f64>>>()?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}
