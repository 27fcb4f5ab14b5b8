//! End-to-end tests for the signal pipeline.

use chrono::{DateTime, Duration, Utc};
use retrace::services::signals::indicators::{Ema, Indicator, Rsi};
use retrace::services::signals::{confidence, find_extrema, validate};
use retrace::{
    analyze_pullbacks, extract_features, generate_signal_at, predict, train, Direction, NoSignal,
    Observation, Prediction, SignalConfig, SignalOutcome, SignalStore, TrainingConfig,
    TrainingOutcome, Trend, ValidationFailure, WeightTable,
};
use std::collections::HashMap;

/// One observation per minute, the last one at `now`.
fn window(now: DateTime<Utc>, prices: &[f64], volume: f64) -> Vec<Observation> {
    let n = prices.len() as i64;
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            Observation::new(now - Duration::minutes(n - 1 - i as i64), price)
                .unwrap()
                .with_volume(volume)
                .unwrap()
        })
        .collect()
}

fn rising(count: usize) -> Vec<f64> {
    (0..count).map(|i| 100.0 * 1.01_f64.powi(i as i32)).collect()
}

/// Rally to 100, dip to 97, recover to a new high at 101, then drift up.
fn dip_and_recover() -> Vec<f64> {
    vec![
        90.0, 92.0, 94.0, 96.0, 98.0, 100.0, 98.5, 97.0, 99.0, 101.0, 100.5, 100.8, 101.2, 101.5,
        101.8, 102.0, 102.2, 102.5, 102.8, 103.0,
    ]
}

/// Uptrend with one 5% retracement inside the trailing twenty samples.
fn trending_with_pullback() -> Vec<f64> {
    vec![
        100.0, 100.5, 101.0, 101.5, 102.0, 100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 102.0, 100.0,
        101.0, 103.0, 105.0, 107.0, 109.0, 108.0, 110.0, 111.0, 112.0, 113.0, 114.0, 115.0,
    ]
}

#[test]
fn test_steady_rise_has_no_pullback_and_no_signal() {
    // constant returns have no volatility; open that gate so only the pullback check remains
    let config = SignalConfig {
        confidence_threshold: 50.0,
        volatility_floor: 0.0,
        ..Default::default()
    };
    let now = Utc::now();
    let obs = window(now, &rising(25), 5000.0);

    let prices: Vec<f64> = obs.iter().map(Observation::price).collect();
    let analysis = analyze_pullbacks(&prices, &config);
    assert!(matches!(analysis.trend, Trend::Uptrend | Trend::StrongUptrend));
    assert!(analysis.pullbacks.is_empty());
    assert!(!analysis.has_valid_pullback);

    let features = extract_features(&obs, &analysis, None, &config).unwrap();
    assert!(!features.pullback.has_valid_pullback);

    let outcome = generate_signal_at("BTC", &obs, &WeightTable::default(), &config, None, now);
    assert!(!outcome.is_released());
    assert_eq!(outcome.failure(), Some(ValidationFailure::NoValidPullback));
}

#[test]
fn test_dip_and_recovery_is_one_valid_pullback() {
    let config = SignalConfig::default();
    let analysis = analyze_pullbacks(&dip_and_recover(), &config);

    assert_eq!(analysis.pullbacks.len(), 1);
    let pullback = analysis.pullbacks[0];
    assert_eq!(pullback.peak.price, 100.0);
    assert_eq!(pullback.valley.price, 97.0);
    assert_eq!(pullback.next_peak.price, 101.0);
    assert!((pullback.depth - 0.03).abs() < 1e-12);
    assert!(pullback.recovery_ratio > 1.0);
    assert!((pullback.recovery - 4.0 / 97.0).abs() < 1e-12);
    assert!(analysis.has_valid_pullback);
}

#[test]
fn test_fourteen_gains_give_rsi_100() {
    let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
    assert_eq!(Rsi::new(14).calculate(&prices), Some(100.0));
}

#[test]
fn test_thin_volume_is_rejected() {
    let config = SignalConfig::default();
    let now = Utc::now();
    let prices: Vec<f64> = (0..20)
        .map(|i| if i % 2 == 0 { 100.0 } else { 103.0 })
        .collect();
    let obs = window(now, &prices, 500.0);
    let analysis = analyze_pullbacks(&prices, &config);
    assert!(analysis.has_valid_pullback);

    let prediction = Prediction {
        direction: Direction::Up,
        confidence: 90,
        score_up: 0.9,
        score_down: 0.1,
        rationale: Vec::new(),
    };
    let result = validate(&prediction, &obs, &analysis, &config, now);
    assert_eq!(
        result,
        Err(ValidationFailure::VolumeBelowFloor {
            volume: 500.0,
            floor: 1000.0
        })
    );
}

#[test]
fn test_signal_released_when_every_gate_passes() {
    let config = SignalConfig {
        confidence_threshold: 50.0,
        ..Default::default()
    };
    let now = Utc::now();
    let obs = window(now, &trending_with_pullback(), 5000.0);
    let weights = WeightTable::default();

    let outcome = generate_signal_at("ETH", &obs, &weights, &config, None, now);
    let signal = outcome.into_signal().expect("signal should be released");

    assert_eq!(signal.instrument, "ETH");
    assert_eq!(signal.direction, Direction::Up);
    assert!(signal.confidence >= 50);
    assert!(signal.score_up > signal.score_down);
    assert_eq!(signal.weights, weights);
    assert_eq!(signal.timestamp, now);
    assert!(signal.rationale.iter().any(|r| r.starts_with("Valid pullback")));
    assert!(signal.features.pullback.has_valid_pullback);
}

#[test]
fn test_same_window_is_rejected_at_default_threshold() {
    let config = SignalConfig::default();
    let now = Utc::now();
    let obs = window(now, &trending_with_pullback(), 5000.0);

    let outcome = generate_signal_at("ETH", &obs, &WeightTable::default(), &config, None, now);
    assert!(matches!(
        outcome.failure(),
        Some(ValidationFailure::ConfidenceBelowThreshold { .. })
    ));
}

#[test]
fn test_stale_window_is_rejected() {
    let config = SignalConfig {
        confidence_threshold: 50.0,
        ..Default::default()
    };
    let now = Utc::now();
    let obs = window(now - Duration::minutes(10), &trending_with_pullback(), 5000.0);

    let outcome = generate_signal_at("ETH", &obs, &WeightTable::default(), &config, None, now);
    assert!(matches!(
        outcome.failure(),
        Some(ValidationFailure::StaleData { .. })
    ));
}

#[test]
fn test_short_window_is_insufficient_data() {
    let now = Utc::now();
    let obs = window(now, &rising(10), 5000.0);
    let outcome = generate_signal_at(
        "BTC",
        &obs,
        &WeightTable::default(),
        &SignalConfig::default(),
        None,
        now,
    );
    assert_eq!(
        outcome,
        SignalOutcome::Withheld(NoSignal::InsufficientData {
            samples: 10,
            required: 20
        })
    );
}

#[test]
fn test_constant_series_rsi_is_defined() {
    let prices = vec![42.0; 30];
    let rsi = Rsi::new(14).calculate(&prices).unwrap();
    assert!(rsi.is_finite());
    assert_eq!(rsi, 100.0);
}

#[test]
fn test_ema_of_one_is_identity() {
    let prices = dip_and_recover();
    assert_eq!(Ema::new(1).smooth(&prices), prices);
}

#[test]
fn test_extrema_are_idempotent_and_disjoint() {
    let prices = trending_with_pullback();
    let first = find_extrema(&prices);
    let second = find_extrema(&prices);
    assert_eq!(first, second);

    let (peaks, valleys) = first;
    assert!(peaks
        .iter()
        .all(|p| valleys.iter().all(|v| v.index != p.index)));
}

#[test]
fn test_confidence_stays_in_range() {
    let config = SignalConfig::default();
    let now = Utc::now();
    for prices in [rising(25), dip_and_recover(), trending_with_pullback()] {
        let obs = window(now, &prices, 5000.0);
        let closes: Vec<f64> = obs.iter().map(Observation::price).collect();
        let analysis = analyze_pullbacks(&closes, &config);
        let features = extract_features(&obs, &analysis, None, &config).unwrap();
        for weights in [WeightTable::default(), WeightTable::uniform(3.0)] {
            let prediction = predict(&features, &weights);
            assert!(prediction.confidence <= 100);
            assert!((0.0..=1.0).contains(&prediction.score_up));
            assert!((0.0..=1.0).contains(&prediction.score_down));
        }
    }
    assert_eq!(confidence(0.0, 0.0), 50);
    assert_eq!(confidence(1.0, 0.0), 100);
}

#[test]
fn test_score_tie_predicts_up() {
    let config = SignalConfig::default();
    let now = Utc::now();
    let obs = window(now, &dip_and_recover(), 5000.0);
    let analysis = analyze_pullbacks(&dip_and_recover(), &config);
    let features = extract_features(&obs, &analysis, None, &config).unwrap();

    let prediction = predict(&features, &WeightTable::uniform(0.0));
    assert_eq!(prediction.score_up, prediction.score_down);
    assert_eq!(prediction.direction, Direction::Up);
    assert_eq!(prediction.confidence, 50);
}

#[test]
fn test_training_skips_small_history() {
    let history = HashMap::from([(
        "BTC".to_string(),
        window(Utc::now(), &rising(50), 5000.0),
    )]);
    let weights = WeightTable::uniform(0.3);
    let outcome = train(
        &history,
        &weights,
        &SignalConfig::default(),
        &TrainingConfig::default(),
    );
    assert!(matches!(outcome, TrainingOutcome::Skipped { samples: 30, .. }));
    assert_eq!(*outcome.weights(), weights);
}

#[tokio::test]
async fn test_store_caches_released_signals() {
    let config = SignalConfig {
        confidence_threshold: 50.0,
        ..Default::default()
    };
    let store = SignalStore::new(config, TrainingConfig::default(), WeightTable::default());
    let now = Utc::now();

    let outcome = store
        .generate("eth", &window(now, &trending_with_pullback(), 5000.0))
        .await;
    assert!(outcome.is_released());

    let cached = store.latest_signal("ETH").unwrap();
    assert_eq!(Some(&cached), outcome.signal());
    assert_eq!(store.latest_signals().len(), 1);

    store.invalidate("ETH");
    assert!(store.latest_signal("ETH").is_none());
}
