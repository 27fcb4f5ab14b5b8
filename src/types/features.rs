use super::observation::IndicatorBundle;
use super::signals::Pattern;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of local extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    Peak,
    Valley,
}

/// A strict local maximum or minimum in a price sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    /// Index into the analysed price slice.
    pub index: usize,
    pub price: f64,
    pub kind: ExtremumKind,
}

/// A peak, the retracement low after it, and the next peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pullback {
    pub peak: Extremum,
    pub valley: Extremum,
    pub next_peak: Extremum,
    /// `(peak - valley) / peak`.
    pub depth: f64,
    /// `(next_peak - valley) / valley`.
    pub recovery: f64,
    /// `depth * recovery`.
    pub strength: f64,
    /// `(next_peak - valley) / (peak - valley)`; above 1.0 the next peak
    /// clears the prior one.
    pub recovery_ratio: f64,
}

/// Whole-window trend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongUptrend,
    Uptrend,
    #[default]
    Sideways,
    Downtrend,
    StrongDowntrend,
}

impl Trend {
    pub fn is_up(&self) -> bool {
        matches!(self, Trend::StrongUptrend | Trend::Uptrend)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Trend::StrongDowntrend | Trend::Downtrend)
    }

    /// Get display label for this trend.
    pub fn label(&self) -> &'static str {
        match self {
            Trend::StrongUptrend => "strong_uptrend",
            Trend::Uptrend => "uptrend",
            Trend::Sideways => "sideways",
            Trend::Downtrend => "downtrend",
            Trend::StrongDowntrend => "strong_downtrend",
        }
    }
}

/// Output of the pullback analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullbackAnalysis {
    pub peaks: Vec<Extremum>,
    pub valleys: Vec<Extremum>,
    pub pullbacks: Vec<Pullback>,
    pub trend: Trend,
    /// Mean depth across pullbacks, 0 when there are none.
    pub average_depth: f64,
    /// Mean recovery across pullbacks, 0 when there are none.
    pub average_recovery: f64,
    pub has_valid_pullback: bool,
}

impl PullbackAnalysis {
    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    pub fn valley_count(&self) -> usize {
        self.valleys.len()
    }
}

/// Market-context values derived from the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContext {
    /// Standard deviation of trailing simple returns.
    pub volatility: f64,
    /// Fractional price change over the momentum lookback.
    pub momentum: f64,
    /// Fractional change of recent versus prior average volume.
    pub volume_trend: f64,
    /// `(price - support) / price`.
    pub support_distance: f64,
    /// `(resistance - price) / price`.
    pub resistance_distance: f64,
}

/// Externally supplied context; present fields replace derived ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketContextOverride {
    pub volatility: Option<f64>,
    pub momentum: Option<f64>,
    pub volume_trend: Option<f64>,
    pub support_distance: Option<f64>,
    pub resistance_distance: Option<f64>,
}

impl MarketContext {
    /// Apply an external override, ignoring non-finite values.
    pub fn merged(self, external: &MarketContextOverride) -> Self {
        let pick = |derived: f64, given: Option<f64>| {
            given.filter(|v| v.is_finite()).unwrap_or(derived)
        };
        Self {
            volatility: pick(self.volatility, external.volatility),
            momentum: pick(self.momentum, external.momentum),
            volume_trend: pick(self.volume_trend, external.volume_trend),
            support_distance: pick(self.support_distance, external.support_distance),
            resistance_distance: pick(self.resistance_distance, external.resistance_distance),
        }
    }
}

/// Everything the scoring engine looks at for one decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureBundle {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: Option<f64>,
    pub indicators: IndicatorBundle,
    /// RSI with the neutral default (50) applied.
    pub rsi: f64,
    pub patterns: Vec<Pattern>,
    pub pullback: PullbackAnalysis,
    pub context: MarketContext,
}

impl FeatureBundle {
    pub fn has_pattern(&self, pattern: Pattern) -> bool {
        self.patterns.contains(&pattern)
    }
}
