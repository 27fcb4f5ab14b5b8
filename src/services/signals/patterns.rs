//! Single-candle pattern classification.

use crate::types::{Candle, Observation, Pattern};

/// Body/range below this is a doji.
const DOJI_MAX_BODY_RATIO: f64 = 0.1;
/// Upper bound of the body/range band for hammers and shooting stars.
const SMALL_BODY_MAX_RATIO: f64 = 0.3;
/// Body/range above this is a marubozu.
const MARUBOZU_MIN_BODY_RATIO: f64 = 0.8;
/// A dominant shadow must exceed this multiple of the body.
const SHADOW_BODY_MULTIPLE: f64 = 2.0;

/// Every pattern a candle matches, in rule order.
///
/// A zero-range candle carries no information and matches nothing.
pub fn classify_candle(candle: &Candle) -> Vec<Pattern> {
    let range = candle.high - candle.low;
    if range <= 0.0 {
        return Vec::new();
    }

    let body = (candle.close - candle.open).abs();
    let ratio = body / range;
    let upper_shadow = candle.high - candle.open.max(candle.close);
    let lower_shadow = candle.open.min(candle.close) - candle.low;

    let mut patterns = Vec::new();

    if ratio < DOJI_MAX_BODY_RATIO {
        patterns.push(Pattern::Doji);
    }

    if (DOJI_MAX_BODY_RATIO..=SMALL_BODY_MAX_RATIO).contains(&ratio) {
        if lower_shadow > SHADOW_BODY_MULTIPLE * body {
            patterns.push(Pattern::Hammer);
        }
        if upper_shadow > SHADOW_BODY_MULTIPLE * body {
            patterns.push(Pattern::ShootingStar);
        }
    }

    if ratio > MARUBOZU_MIN_BODY_RATIO {
        if candle.close > candle.open {
            patterns.push(Pattern::MarubozuUp);
        } else {
            patterns.push(Pattern::MarubozuDown);
        }
    }

    patterns
}

/// Patterns over the last `lookback` observations, newest first, without
/// duplicates. Observations lacking open/high/low are ignored.
pub fn recent_patterns(window: &[Observation], lookback: usize) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for observation in window.iter().rev().take(lookback) {
        let Some(candle) = observation.candle() else {
            continue;
        };
        for pattern in classify_candle(&candle) {
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}
