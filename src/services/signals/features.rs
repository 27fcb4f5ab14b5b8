//! Feature extraction: one [`FeatureBundle`] per decision point.

use super::indicators::{bollinger::std_dev, compute_indicators};
use super::patterns::recent_patterns;
use crate::config::SignalConfig;
use crate::types::{
    closes, volumes, FeatureBundle, MarketContext, MarketContextOverride, Observation,
    PullbackAnalysis,
};

/// Neutral RSI used when the oscillator is absent.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Transitions the momentum value spans.
const MOMENTUM_LOOKBACK: usize = 10;

/// Observations in each half of the volume-trend comparison.
const VOLUME_TREND_SPAN: usize = 5;

/// Population standard deviation of the last `lookback` simple returns.
///
/// Fewer than two returns read as zero volatility.
pub fn return_volatility(prices: &[f64], lookback: usize) -> f64 {
    let start = prices.len().saturating_sub(lookback.saturating_add(1));
    let returns: Vec<f64> = prices[start..]
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    std_dev(&returns, mean)
}

fn momentum(prices: &[f64]) -> f64 {
    let Some(&last) = prices.last() else {
        return 0.0;
    };
    let base = prices[prices.len().saturating_sub(MOMENTUM_LOOKBACK + 1)];
    if base > 0.0 {
        (last - base) / base
    } else {
        0.0
    }
}

fn volume_trend(window: &[Observation]) -> f64 {
    if window.len() < VOLUME_TREND_SPAN * 2 {
        return 0.0;
    }
    let Some(recent) = volumes(&window[window.len() - VOLUME_TREND_SPAN * 2..]) else {
        return 0.0;
    };

    let (prior, latest) = recent.split_at(VOLUME_TREND_SPAN);
    let prior_mean = prior.iter().sum::<f64>() / VOLUME_TREND_SPAN as f64;
    let latest_mean = latest.iter().sum::<f64>() / VOLUME_TREND_SPAN as f64;
    if prior_mean > 0.0 {
        (latest_mean - prior_mean) / prior_mean
    } else {
        0.0
    }
}

/// Derive market context from the window.
///
/// Support and resistance are the extremes of the pullback analysis window.
pub fn market_context(window: &[Observation], config: &SignalConfig) -> MarketContext {
    let prices = closes(window);
    let Some(&price) = prices.last() else {
        return MarketContext::default();
    };

    let analysed = &prices[prices.len().saturating_sub(config.pullback_analysis_depth)..];
    let support = analysed.iter().copied().fold(f64::INFINITY, f64::min);
    let resistance = analysed.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    MarketContext {
        volatility: return_volatility(&prices, config.volatility_lookback),
        momentum: momentum(&prices),
        volume_trend: volume_trend(window),
        support_distance: (price - support) / price,
        resistance_distance: (resistance - price) / price,
    }
}

/// Assemble the feature bundle for the latest observation of `window`.
///
/// Returns `None` when the window is shorter than the pullback analysis
/// depth. Missing optional inputs fall back to neutral values.
pub fn extract_features(
    window: &[Observation],
    analysis: &PullbackAnalysis,
    external: Option<&MarketContextOverride>,
    config: &SignalConfig,
) -> Option<FeatureBundle> {
    if window.len() < config.pullback_analysis_depth {
        return None;
    }
    let latest = window.last()?;

    let indicators = match latest.indicators() {
        Some(bundle) => bundle.clone(),
        None => {
            let prices = closes(window);
            let vols = volumes(window);
            compute_indicators(&prices, vols.as_deref(), &config.indicators)
        }
    };

    let derived = market_context(window, config);
    let context = match external {
        Some(overrides) => derived.merged(overrides),
        None => derived,
    };

    Some(FeatureBundle {
        timestamp: latest.timestamp(),
        price: latest.price(),
        volume: latest.volume(),
        rsi: indicators.rsi.unwrap_or(NEUTRAL_RSI),
        indicators,
        patterns: recent_patterns(window, config.pattern_lookback),
        pullback: analysis.clone(),
        context,
    })
}
