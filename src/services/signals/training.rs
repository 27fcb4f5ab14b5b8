//! Simulated training: replay historical windows and nudge weights.
//!
//! This is a measurement loop, not a learner. Every sample is scored with
//! the same static weights, so each epoch reproduces the same hit rate; the
//! only update is one multiplicative adjustment after the run.

use super::features::extract_features;
use super::pullback::analyze_pullbacks;
use super::scoring::predict;
use crate::config::{SignalConfig, TrainingConfig, WeightBounds};
use crate::types::{
    closes, Direction, FeatureBundle, Observation, TrainingOutcome, TrainingReport,
    WeightAdjustment, WeightTable,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Accuracy above which weights are reinforced.
const REINFORCE_ABOVE: f64 = 0.8;
/// Accuracy below which weights are dampened.
const DAMPEN_BELOW: f64 = 0.6;
const REINFORCE_FACTOR: f64 = 1.01;
const DAMPEN_FACTOR: f64 = 0.99;

/// A feature bundle and the direction the next observation actually took.
#[derive(Debug, Clone)]
pub struct Sample {
    pub instrument: String,
    pub features: FeatureBundle,
    pub label: Direction,
}

/// Build supervised samples from every instrument's history.
///
/// Each group is sorted by timestamp (stable, duplicates kept). Every run of
/// `window_size` consecutive observations is labelled by the observation
/// after it: `Up` only if its price is strictly higher. Returns the samples
/// and the number of windows skipped for lack of features.
pub fn build_samples(
    history: &HashMap<String, Vec<Observation>>,
    signal_config: &SignalConfig,
    training_config: &TrainingConfig,
) -> (Vec<Sample>, usize) {
    let size = training_config.window_size;
    let mut instruments: Vec<&String> = history.keys().collect();
    instruments.sort();

    let mut samples = Vec::new();
    let mut skipped = 0;

    for instrument in instruments {
        let mut series = history[instrument].clone();
        series.sort_by_key(Observation::timestamp);

        for end in size..series.len() {
            let window = &series[end - size..end];
            let current = window[size - 1].price();
            let next = series[end].price();

            let analysis = analyze_pullbacks(&closes(window), signal_config);
            match extract_features(window, &analysis, None, signal_config) {
                Some(features) => samples.push(Sample {
                    instrument: instrument.clone(),
                    features,
                    label: Direction::from_move(current, next),
                }),
                None => skipped += 1,
            }
        }
    }

    (samples, skipped)
}

/// Apply the post-run adjustment rule, then the optional bounds.
pub fn adjust_weights(
    accuracy: f64,
    weights: &WeightTable,
    bounds: Option<WeightBounds>,
) -> (WeightAdjustment, WeightTable) {
    let (adjustment, adjusted) = if accuracy > REINFORCE_ABOVE {
        (WeightAdjustment::Reinforced, weights.scaled(REINFORCE_FACTOR))
    } else if accuracy < DAMPEN_BELOW {
        (WeightAdjustment::Dampened, weights.scaled(DAMPEN_FACTOR))
    } else {
        return (WeightAdjustment::Unchanged, *weights);
    };

    match bounds {
        Some(bounds) => (adjustment, adjusted.clamped(bounds.min, bounds.max)),
        None => (adjustment, adjusted),
    }
}

/// Replay history through the scoring engine and return adjusted weights.
///
/// Fewer than `min_samples` samples skips the run and hands the weights
/// back unchanged.
pub fn train(
    history: &HashMap<String, Vec<Observation>>,
    weights: &WeightTable,
    signal_config: &SignalConfig,
    training_config: &TrainingConfig,
) -> TrainingOutcome {
    let (samples, skipped_windows) = build_samples(history, signal_config, training_config);

    if samples.len() < training_config.min_samples {
        warn!(
            "Skipping training: {} samples from {} instruments, need {}",
            samples.len(),
            history.len(),
            training_config.min_samples
        );
        return TrainingOutcome::Skipped {
            samples: samples.len(),
            required: training_config.min_samples,
            weights: *weights,
        };
    }

    info!(
        "Training on {} samples ({} windows skipped), {} epochs of batch size {}",
        samples.len(),
        skipped_windows,
        training_config.epochs,
        training_config.batch_size
    );

    let mut correct: u64 = 0;
    let mut total: u64 = 0;
    let mut epochs_run = 0;

    for epoch in 1..=training_config.epochs {
        for batch in samples.chunks(training_config.batch_size) {
            for sample in batch {
                total += 1;
                if predict(&sample.features, weights).direction == sample.label {
                    correct += 1;
                }
            }
        }
        epochs_run = epoch;

        let accuracy = correct as f64 / total as f64;
        debug!(
            "Epoch {}/{}: cumulative accuracy {:.2}%",
            epoch,
            training_config.epochs,
            accuracy * 100.0
        );
        if accuracy >= training_config.target_accuracy {
            debug!(
                "Target accuracy {:.2}% reached after epoch {}",
                training_config.target_accuracy * 100.0,
                epoch
            );
            break;
        }
    }

    let accuracy = correct as f64 / total as f64;
    let (adjustment, updated) = adjust_weights(accuracy, weights, training_config.weight_bounds);

    info!(
        "Training complete: {:.2}% accuracy ({}/{}), weights {:?}",
        accuracy * 100.0,
        correct,
        total,
        adjustment
    );

    TrainingOutcome::Completed(TrainingReport {
        accuracy,
        correct,
        total,
        samples: samples.len(),
        skipped_windows,
        epochs_run,
        adjustment,
        weights: updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    fn series(count: usize, price_at: impl Fn(usize) -> f64) -> Vec<Observation> {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        (0..count)
            .map(|i| {
                Observation::new(start + Duration::minutes(i as i64), price_at(i))
                    .unwrap()
                    .with_volume(5000.0)
                    .unwrap()
            })
            .collect()
    }

    fn history(count: usize, price_at: impl Fn(usize) -> f64) -> HashMap<String, Vec<Observation>> {
        HashMap::from([("BTC".to_string(), series(count, price_at))])
    }

    #[test]
    fn test_samples_one_per_window() {
        let (samples, skipped) = build_samples(
            &history(30, |i| 100.0 + i as f64),
            &SignalConfig::default(),
            &TrainingConfig::default(),
        );
        assert_eq!(samples.len(), 10);
        assert_eq!(skipped, 0);
        assert!(samples.iter().all(|s| s.label == Direction::Up));
    }

    #[test]
    fn test_samples_sorted_by_timestamp() {
        let mut obs = series(25, |i| 100.0 + i as f64);
        obs.reverse();
        let history = HashMap::from([("ETH".to_string(), obs)]);
        let (samples, _) =
            build_samples(&history, &SignalConfig::default(), &TrainingConfig::default());
        assert!(samples.iter().all(|s| s.label == Direction::Up));
    }

    #[test]
    fn test_equal_prices_label_down() {
        let (samples, _) = build_samples(
            &history(25, |_| 100.0),
            &SignalConfig::default(),
            &TrainingConfig::default(),
        );
        assert!(samples.iter().all(|s| s.label == Direction::Down));
    }

    #[test]
    fn test_short_windows_are_skipped_not_fatal() {
        let signal_config = SignalConfig {
            pullback_analysis_depth: 30,
            ..Default::default()
        };
        let (samples, skipped) = build_samples(
            &history(25, |i| 100.0 + i as f64),
            &signal_config,
            &TrainingConfig::default(),
        );
        assert!(samples.is_empty());
        assert_eq!(skipped, 5);
    }

    #[test]
    fn test_too_few_samples_skips() {
        let weights = WeightTable::default();
        let outcome = train(
            &history(60, |i| 100.0 + i as f64),
            &weights,
            &SignalConfig::default(),
            &TrainingConfig::default(),
        );
        match outcome {
            TrainingOutcome::Skipped { samples, required, weights: returned } => {
                assert_eq!(samples, 40);
                assert_eq!(required, 100);
                assert_eq!(returned, weights);
            }
            other => panic!("expected skip, got {:?}", other),
        }
    }

    #[test]
    fn test_steady_rise_reinforces() {
        let weights = WeightTable::default();
        let outcome = train(
            &history(140, |i| 100.0 * 1.01_f64.powi(i as i32)),
            &weights,
            &SignalConfig::default(),
            &TrainingConfig::default(),
        );
        let TrainingOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.samples, 120);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.adjustment, WeightAdjustment::Reinforced);
        assert_eq!(report.epochs_run, 1);
        assert_eq!(report.weights, weights.scaled(1.01));
    }

    #[test]
    fn test_accuracy_accumulates_over_all_epochs() {
        let training_config = TrainingConfig {
            epochs: 3,
            batch_size: 7,
            target_accuracy: 1.0,
            ..Default::default()
        };
        let outcome = train(
            &history(150, |i| 100.0 + (i as f64 * 0.7).sin() * 4.0 + i as f64 * 0.05),
            &WeightTable::default(),
            &SignalConfig::default(),
            &training_config,
        );
        let TrainingOutcome::Completed(report) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(report.total, report.samples as u64 * report.epochs_run as u64);
        if report.accuracy < 1.0 {
            assert_eq!(report.epochs_run, 3);
        }
        assert!((0.0..=1.0).contains(&report.accuracy));
    }

    #[test]
    fn test_adjustment_bands() {
        let weights = WeightTable::uniform(1.0);

        let (adj, w) = adjust_weights(0.81, &weights, None);
        assert_eq!(adj, WeightAdjustment::Reinforced);
        assert_eq!(w, weights.scaled(1.01));

        let (adj, w) = adjust_weights(0.59, &weights, None);
        assert_eq!(adj, WeightAdjustment::Dampened);
        assert_eq!(w, weights.scaled(0.99));

        for accuracy in [0.6, 0.7, 0.8] {
            let (adj, w) = adjust_weights(accuracy, &weights, None);
            assert_eq!(adj, WeightAdjustment::Unchanged);
            assert_eq!(w, weights);
        }
    }

    #[test]
    fn test_bounds_cap_repeated_reinforcement() {
        let bounds = Some(WeightBounds { min: 0.01, max: 1.05 });
        let mut weights = WeightTable::uniform(1.0);
        for _ in 0..20 {
            weights = adjust_weights(0.95, &weights, bounds).1;
        }
        assert!(weights.iter().all(|(_, w)| w == 1.05));
    }
}
