//! End-to-end signal generation for one instrument window.

use super::features::extract_features;
use super::pullback::analyze_pullbacks;
use super::scoring::predict;
use super::validator::validate;
use crate::config::SignalConfig;
use crate::types::{
    closes, MarketContextOverride, NoSignal, Observation, Signal, SignalOutcome, WeightTable,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// Run the full pipeline against the current wall clock.
pub fn generate_signal(
    instrument: &str,
    window: &[Observation],
    weights: &WeightTable,
    config: &SignalConfig,
) -> SignalOutcome {
    generate_signal_at(instrument, window, weights, config, None, Utc::now())
}

/// Run the full pipeline as of `now`, with optional external market context.
pub fn generate_signal_at(
    instrument: &str,
    window: &[Observation],
    weights: &WeightTable,
    config: &SignalConfig,
    context: Option<&MarketContextOverride>,
    now: DateTime<Utc>,
) -> SignalOutcome {
    let prices = closes(window);
    let analysis = analyze_pullbacks(&prices, config);

    let Some(features) = extract_features(window, &analysis, context, config) else {
        debug!(
            "Insufficient data for {}: {} samples, need {}",
            instrument,
            window.len(),
            config.pullback_analysis_depth
        );
        return SignalOutcome::Withheld(NoSignal::InsufficientData {
            samples: window.len(),
            required: config.pullback_analysis_depth,
        });
    };

    let prediction = predict(&features, weights);

    if let Err(failure) = validate(&prediction, window, &analysis, config, now) {
        debug!(
            "Signal for {} withheld ({} {}%, {} peaks/{} valleys): {}",
            instrument,
            prediction.direction,
            prediction.confidence,
            analysis.peak_count(),
            analysis.valley_count(),
            failure
        );
        return SignalOutcome::Withheld(NoSignal::Rejected {
            failure,
            prediction,
        });
    }

    info!(
        "Signal for {}: {} with {}% confidence ({} reasons)",
        instrument,
        prediction.direction,
        prediction.confidence,
        prediction.rationale.len()
    );

    SignalOutcome::Released(Signal {
        id: Uuid::new_v4(),
        instrument: instrument.to_string(),
        direction: prediction.direction,
        confidence: prediction.confidence,
        score_up: prediction.score_up,
        score_down: prediction.score_down,
        rationale: prediction.rationale,
        features,
        weights: *weights,
        timestamp: now,
    })
}
