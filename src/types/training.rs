use super::weights::WeightTable;
use serde::{Deserialize, Serialize};

/// How the weight table was adjusted after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightAdjustment {
    /// Accuracy above the upper band: weights multiplied by 1.01.
    Reinforced,
    /// Accuracy below the lower band: weights multiplied by 0.99.
    Dampened,
    Unchanged,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    /// correct / total over every epoch run (0-1).
    pub accuracy: f64,
    pub correct: u64,
    pub total: u64,
    /// Scorable samples per epoch.
    pub samples: usize,
    /// Windows dropped because no features could be extracted.
    pub skipped_windows: usize,
    pub epochs_run: usize,
    pub adjustment: WeightAdjustment,
    /// Weights to persist and feed back into scoring.
    pub weights: WeightTable,
}

/// Result of a training call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TrainingOutcome {
    Completed(TrainingReport),
    /// Too few samples; weights are returned untouched.
    Skipped {
        samples: usize,
        required: usize,
        weights: WeightTable,
    },
}

impl TrainingOutcome {
    /// Weights to use after this call, adjusted or not.
    pub fn weights(&self) -> &WeightTable {
        match self {
            TrainingOutcome::Completed(report) => &report.weights,
            TrainingOutcome::Skipped { weights, .. } => weights,
        }
    }

    /// Overall accuracy, `None` when training was skipped.
    pub fn accuracy(&self) -> Option<f64> {
        match self {
            TrainingOutcome::Completed(report) => Some(report.accuracy),
            TrainingOutcome::Skipped { .. } => None,
        }
    }
}
