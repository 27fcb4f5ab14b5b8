//! Guard conditions a scored candidate must pass before release.

use super::features::return_volatility;
use crate::config::SignalConfig;
use crate::types::{closes, Observation, Prediction, PullbackAnalysis, ValidationFailure};
use chrono::{DateTime, Utc};

/// Run every gate in order; the first failure is returned.
///
/// Gates: confidence, data age, volume floor (only when volume is
/// reported), trailing return volatility, valid pullback.
pub fn validate(
    prediction: &Prediction,
    window: &[Observation],
    analysis: &PullbackAnalysis,
    config: &SignalConfig,
    now: DateTime<Utc>,
) -> Result<(), ValidationFailure> {
    if f64::from(prediction.confidence) < config.confidence_threshold {
        return Err(ValidationFailure::ConfidenceBelowThreshold {
            confidence: prediction.confidence,
            threshold: config.confidence_threshold,
        });
    }

    let Some(latest) = window.last() else {
        return Err(ValidationFailure::StaleData {
            age_secs: i64::MAX,
            max_age_secs: config.max_data_age_secs,
        });
    };

    let age = now - latest.timestamp();
    if age > config.max_data_age() {
        return Err(ValidationFailure::StaleData {
            age_secs: age.num_seconds(),
            max_age_secs: config.max_data_age_secs,
        });
    }

    if let Some(volume) = latest.volume() {
        if volume < config.volume_floor {
            return Err(ValidationFailure::VolumeBelowFloor {
                volume,
                floor: config.volume_floor,
            });
        }
    }

    let volatility = return_volatility(&closes(window), config.volatility_lookback);
    if volatility < config.volatility_floor {
        return Err(ValidationFailure::VolatilityBelowFloor {
            volatility,
            floor: config.volatility_floor,
        });
    }

    if !analysis.has_valid_pullback {
        return Err(ValidationFailure::NoValidPullback);
    }

    Ok(())
}
