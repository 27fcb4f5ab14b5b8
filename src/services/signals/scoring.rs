//! Weighted rule scoring and direction prediction.

use crate::types::{Direction, FeatureBundle, Pattern, Prediction, WeightKey, WeightTable};

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// Rules that fired for one direction.
struct Evidence<'w> {
    weights: &'w WeightTable,
    total: f64,
    reasons: Vec<String>,
}

impl<'w> Evidence<'w> {
    fn new(weights: &'w WeightTable) -> Self {
        Self {
            weights,
            total: 0.0,
            reasons: Vec::new(),
        }
    }

    fn add(&mut self, key: WeightKey, reason: String) {
        self.total += self.weights.get(key);
        self.reasons.push(reason);
    }

    fn score(&self) -> f64 {
        if self.total.is_finite() {
            self.total.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn evaluate<'w>(
    features: &FeatureBundle,
    direction: Direction,
    weights: &'w WeightTable,
) -> Evidence<'w> {
    let mut evidence = Evidence::new(weights);
    let up = direction == Direction::Up;
    let ind = &features.indicators;

    // Momentum oscillator: reward the side that is not at an extreme.
    if up && features.rsi < RSI_OVERBOUGHT {
        evidence.add(WeightKey::Rsi, format!("RSI {:.1} not overbought", features.rsi));
    } else if !up && features.rsi > RSI_OVERSOLD {
        evidence.add(WeightKey::Rsi, format!("RSI {:.1} not oversold", features.rsi));
    }

    if let Some(macd) = ind.macd {
        if up && macd.main > macd.signal {
            evidence.add(WeightKey::Macd, "MACD above signal line".to_string());
        } else if !up && macd.main < macd.signal {
            evidence.add(WeightKey::Macd, "MACD below signal line".to_string());
        }
    }

    if let Some(bands) = ind.bollinger {
        if up && features.price < bands.lower {
            evidence.add(WeightKey::Bollinger, "Price below lower Bollinger band".to_string());
        } else if !up && features.price > bands.upper {
            evidence.add(WeightKey::Bollinger, "Price above upper Bollinger band".to_string());
        }
    }

    if up && features.has_pattern(Pattern::Hammer) {
        evidence.add(WeightKey::Patterns, "Hammer candle".to_string());
    } else if !up && features.has_pattern(Pattern::ShootingStar) {
        evidence.add(WeightKey::Patterns, "Shooting star candle".to_string());
    }

    let trend = features.pullback.trend;
    if (up && trend.is_up()) || (!up && trend.is_down()) {
        evidence.add(WeightKey::Trend, format!("Trend is {}", trend.label()));
    }

    if up && features.pullback.has_valid_pullback {
        evidence.add(
            WeightKey::Pullbacks,
            format!(
                "Valid pullback, average depth {:.2}%",
                features.pullback.average_depth * 100.0
            ),
        );
    }

    let momentum = features.context.momentum;
    if (up && momentum > 0.0) || (!up && momentum < 0.0) {
        evidence.add(
            WeightKey::Momentum,
            format!("Momentum {:+.2}%", momentum * 100.0),
        );
    }

    let volume_trend = features.context.volume_trend;
    if (up && volume_trend > 0.0) || (!up && volume_trend < 0.0) {
        evidence.add(
            WeightKey::Volume,
            format!("Volume trend {:+.2}%", volume_trend * 100.0),
        );
    }

    evidence
}

/// Weighted evidence for `direction`, clamped to `[0, 1]`.
pub fn score(features: &FeatureBundle, direction: Direction, weights: &WeightTable) -> f64 {
    evaluate(features, direction, weights).score()
}

/// `round(100 * max / (up + down))`, or 50 when there is no evidence at all.
pub fn confidence(score_up: f64, score_down: f64) -> u8 {
    let total = score_up + score_down;
    if total <= 0.0 || !total.is_finite() {
        return 50;
    }
    let ratio = score_up.max(score_down) / total;
    (100.0 * ratio).round().clamp(0.0, 100.0) as u8
}

/// Score both directions and pick the higher one; ties go to `Up`.
pub fn predict(features: &FeatureBundle, weights: &WeightTable) -> Prediction {
    let up = evaluate(features, Direction::Up, weights);
    let down = evaluate(features, Direction::Down, weights);
    let (score_up, score_down) = (up.score(), down.score());

    let (direction, rationale) = if score_up >= score_down {
        (Direction::Up, up.reasons)
    } else {
        (Direction::Down, down.reasons)
    };

    Prediction {
        direction,
        confidence: confidence(score_up, score_down),
        score_up,
        score_down,
        rationale,
    }
}
