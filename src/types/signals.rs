use super::features::FeatureBundle;
use super::weights::WeightTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of a next-period move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Label for a realised move: strictly higher is `Up`, anything else `Down`.
    pub fn from_move(current: f64, next: f64) -> Self {
        if next > current {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Get display label for this direction.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Single-candle pattern label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Doji,
    Hammer,
    ShootingStar,
    MarubozuUp,
    MarubozuDown,
}

impl Pattern {
    /// Get display name for this pattern.
    pub fn name(&self) -> &'static str {
        match self {
            Pattern::Doji => "doji",
            Pattern::Hammer => "hammer",
            Pattern::ShootingStar => "shooting-star",
            Pattern::MarubozuUp => "marubozu-up",
            Pattern::MarubozuDown => "marubozu-down",
        }
    }
}

/// Scores for both directions and the resulting call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub direction: Direction,
    /// 0-100.
    pub confidence: u8,
    pub score_up: f64,
    pub score_down: f64,
    /// Reasons that fired for the predicted direction, in rule order.
    pub rationale: Vec<String>,
}

/// The validator gate that stopped a signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "gate")]
pub enum ValidationFailure {
    ConfidenceBelowThreshold { confidence: u8, threshold: f64 },
    StaleData { age_secs: i64, max_age_secs: i64 },
    VolumeBelowFloor { volume: f64, floor: f64 },
    VolatilityBelowFloor { volatility: f64, floor: f64 },
    NoValidPullback,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::ConfidenceBelowThreshold { confidence, threshold } => {
                write!(f, "confidence {} below threshold {}", confidence, threshold)
            }
            ValidationFailure::StaleData { age_secs, max_age_secs } => {
                write!(f, "latest observation is {}s old (max {}s)", age_secs, max_age_secs)
            }
            ValidationFailure::VolumeBelowFloor { volume, floor } => {
                write!(f, "volume {} below floor {}", volume, floor)
            }
            ValidationFailure::VolatilityBelowFloor { volatility, floor } => {
                write!(f, "volatility {:.6} below floor {}", volatility, floor)
            }
            ValidationFailure::NoValidPullback => f.write_str("no valid pullback"),
        }
    }
}

/// Why no signal was released this round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum NoSignal {
    /// Window too short to extract features.
    InsufficientData { samples: usize, required: usize },
    /// A validator gate failed.
    Rejected {
        failure: ValidationFailure,
        prediction: Prediction,
    },
}

/// A released directional signal. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: Uuid,
    pub instrument: String,
    pub direction: Direction,
    /// 0-100.
    pub confidence: u8,
    pub score_up: f64,
    pub score_down: f64,
    pub rationale: Vec<String>,
    pub features: FeatureBundle,
    pub weights: WeightTable,
    pub timestamp: DateTime<Utc>,
}

/// Result of one pass through the signal pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SignalOutcome {
    Released(Signal),
    Withheld(NoSignal),
}

impl SignalOutcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            SignalOutcome::Released(signal) => Some(signal),
            SignalOutcome::Withheld(_) => None,
        }
    }

    pub fn into_signal(self) -> Option<Signal> {
        match self {
            SignalOutcome::Released(signal) => Some(signal),
            SignalOutcome::Withheld(_) => None,
        }
    }

    /// The failing gate, if a validator check stopped the signal.
    pub fn failure(&self) -> Option<ValidationFailure> {
        match self {
            SignalOutcome::Withheld(NoSignal::Rejected { failure, .. }) => Some(*failure),
            _ => None,
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self, SignalOutcome::Released(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_prices_label_down() {
        assert_eq!(Direction::from_move(100.0, 100.0), Direction::Down);
        assert_eq!(Direction::from_move(100.0, 100.01), Direction::Up);
        assert_eq!(Direction::from_move(100.0, 99.0), Direction::Down);
    }

    #[test]
    fn test_failure_serializes_gate() {
        let failure = ValidationFailure::VolumeBelowFloor {
            volume: 500.0,
            floor: 1000.0,
        };
        let json = serde_json::to_value(failure).unwrap();
        assert_eq!(json["gate"], "volume_below_floor");
        assert_eq!(json["volume"], 500.0);
    }

    #[test]
    fn test_pattern_names() {
        assert_eq!(Pattern::ShootingStar.name(), "shooting-star");
        assert_eq!(Pattern::MarubozuDown.name(), "marubozu-down");
    }
}
