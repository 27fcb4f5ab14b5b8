use crate::error::{Result, SignalError};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Upper bound for `max_data_age_secs`: one year.
pub const MAX_DATA_AGE_CEILING_SECS: i64 = 365 * 24 * 60 * 60;

/// Periods for every indicator in an [`crate::types::IndicatorBundle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Short, medium and long SMA periods.
    pub sma_periods: [usize; 3],
    /// Fast EMA period (also the MACD fast line).
    pub ema_fast: usize,
    /// Slow EMA period (also the MACD slow line).
    pub ema_slow: usize,
    /// MACD signal smoothing period.
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    /// Band width in standard deviations.
    pub bollinger_width: f64,
    /// Volume SMA period.
    pub volume_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_periods: [5, 10, 20],
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_width: 2.0,
            volume_period: 20,
        }
    }
}

impl IndicatorConfig {
    fn validate(&self) -> Result<()> {
        let periods = [
            ("sma_periods[0]", self.sma_periods[0]),
            ("sma_periods[1]", self.sma_periods[1]),
            ("sma_periods[2]", self.sma_periods[2]),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("bollinger_period", self.bollinger_period),
            ("volume_period", self.volume_period),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(SignalError::config(format!("{} must be positive", name)));
            }
        }
        if self.ema_fast >= self.ema_slow {
            return Err(SignalError::config(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        if !(self.bollinger_width > 0.0 && self.bollinger_width.is_finite()) {
            return Err(SignalError::config("bollinger_width must be positive"));
        }
        Ok(())
    }
}

/// Whole-window percentage change thresholds used to label the trend.
///
/// Values are fractions: `0.05` means 5%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// Beyond this the trend is "strong".
    pub strong: f64,
    /// Beyond this (and within `strong`) the trend is a plain up/down trend.
    pub normal: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            strong: 0.05,
            normal: 0.02,
        }
    }
}

/// Configuration for the live signal path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Minimum confidence (0-100) a signal needs to be released.
    pub confidence_threshold: f64,
    /// Mean pullback depth (fraction) required for a valid pullback.
    pub pullback_min_depth: f64,
    /// Number of trailing prices the pullback analyzer looks at. Also the
    /// minimum window length for feature extraction.
    pub pullback_analysis_depth: usize,
    /// Minimum latest volume, checked only when volume is reported.
    pub volume_floor: f64,
    /// Minimum trailing return volatility.
    pub volatility_floor: f64,
    /// Number of trailing returns the volatility gate measures.
    pub volatility_lookback: usize,
    /// Maximum age of the latest observation, in seconds.
    pub max_data_age_secs: i64,
    /// Number of trailing candles scanned for patterns.
    pub pattern_lookback: usize,
    pub trend: TrendThresholds,
    pub indicators: IndicatorConfig,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 85.0,
            pullback_min_depth: 0.02,
            pullback_analysis_depth: 20,
            volume_floor: 1000.0,
            volatility_floor: 0.001,
            volatility_lookback: 10,
            max_data_age_secs: 300,
            pattern_lookback: 3,
            trend: TrendThresholds::default(),
            indicators: IndicatorConfig::default(),
        }
    }
}

impl SignalConfig {
    /// Load configuration from `RETRACE_*` environment variables.
    ///
    /// Unset variables fall back to defaults; unparsable ones are rejected.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            confidence_threshold: env_or(
                "RETRACE_CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            )?,
            pullback_min_depth: env_or(
                "RETRACE_PULLBACK_MIN_DEPTH",
                defaults.pullback_min_depth,
            )?,
            pullback_analysis_depth: env_or(
                "RETRACE_PULLBACK_ANALYSIS_DEPTH",
                defaults.pullback_analysis_depth,
            )?,
            volume_floor: env_or("RETRACE_VOLUME_FLOOR", defaults.volume_floor)?,
            volatility_floor: env_or("RETRACE_VOLATILITY_FLOOR", defaults.volatility_floor)?,
            volatility_lookback: env_or(
                "RETRACE_VOLATILITY_LOOKBACK",
                defaults.volatility_lookback,
            )?,
            max_data_age_secs: env_or("RETRACE_MAX_DATA_AGE_SECS", defaults.max_data_age_secs)?,
            pattern_lookback: env_or("RETRACE_PATTERN_LOOKBACK", defaults.pattern_lookback)?,
            trend: TrendThresholds {
                strong: env_or("RETRACE_TREND_STRONG", defaults.trend.strong)?,
                normal: env_or("RETRACE_TREND_NORMAL", defaults.trend.normal)?,
            },
            indicators: defaults.indicators,
        };
        config.validate()
    }

    /// Check every field, returning the configuration unchanged when valid.
    pub fn validate(self) -> Result<Self> {
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(SignalError::config(format!(
                "confidence_threshold must be within [0, 100], got {}",
                self.confidence_threshold
            )));
        }
        if !(self.pullback_min_depth >= 0.0 && self.pullback_min_depth < 1.0) {
            return Err(SignalError::config(format!(
                "pullback_min_depth must be within [0, 1), got {}",
                self.pullback_min_depth
            )));
        }
        if self.pullback_analysis_depth < 3 {
            return Err(SignalError::config(
                "pullback_analysis_depth must cover at least 3 samples",
            ));
        }
        if self.volume_floor < 0.0 || self.volume_floor.is_nan() {
            return Err(SignalError::config("volume_floor must be non-negative"));
        }
        if self.volatility_floor < 0.0 || self.volatility_floor.is_nan() {
            return Err(SignalError::config("volatility_floor must be non-negative"));
        }
        if self.volatility_lookback < 2 {
            return Err(SignalError::config("volatility_lookback must be at least 2"));
        }
        if self.max_data_age_secs <= 0 || self.max_data_age_secs > MAX_DATA_AGE_CEILING_SECS {
            return Err(SignalError::config(format!(
                "max_data_age_secs must be within [1, {}], got {}",
                MAX_DATA_AGE_CEILING_SECS, self.max_data_age_secs
            )));
        }
        if self.pattern_lookback == 0 {
            return Err(SignalError::config("pattern_lookback must be positive"));
        }
        if !(self.trend.normal > 0.0 && self.trend.strong > self.trend.normal) {
            return Err(SignalError::config(format!(
                "trend thresholds must satisfy 0 < normal < strong, got normal={} strong={}",
                self.trend.normal, self.trend.strong
            )));
        }
        self.indicators.validate()?;
        Ok(self)
    }

    /// Maximum data age as a chrono duration, clamped to the accepted range.
    pub fn max_data_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_data_age_secs.clamp(0, MAX_DATA_AGE_CEILING_SECS))
    }
}

/// Inclusive bounds applied to every weight after a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for WeightBounds {
    fn default() -> Self {
        Self { min: 0.01, max: 5.0 }
    }
}

/// Configuration for the training simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    /// Accuracy (0-1) at which remaining epochs are skipped.
    pub target_accuracy: f64,
    /// Observations per supervised sample.
    pub window_size: usize,
    /// Below this many samples training is skipped.
    pub min_samples: usize,
    /// `None` leaves weights unbounded.
    pub weight_bounds: Option<WeightBounds>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            target_accuracy: 0.8,
            window_size: 20,
            min_samples: 100,
            weight_bounds: Some(WeightBounds::default()),
        }
    }
}

impl TrainingConfig {
    /// Load configuration from `RETRACE_TRAINING_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let unbounded = env::var("RETRACE_TRAINING_UNBOUNDED_WEIGHTS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let bounds = defaults.weight_bounds.unwrap_or_default();
        let config = Self {
            epochs: env_or("RETRACE_TRAINING_EPOCHS", defaults.epochs)?,
            batch_size: env_or("RETRACE_TRAINING_BATCH_SIZE", defaults.batch_size)?,
            target_accuracy: env_or(
                "RETRACE_TRAINING_TARGET_ACCURACY",
                defaults.target_accuracy,
            )?,
            window_size: env_or("RETRACE_TRAINING_WINDOW", defaults.window_size)?,
            min_samples: env_or("RETRACE_TRAINING_MIN_SAMPLES", defaults.min_samples)?,
            weight_bounds: if unbounded {
                None
            } else {
                Some(WeightBounds {
                    min: env_or("RETRACE_TRAINING_WEIGHT_MIN", bounds.min)?,
                    max: env_or("RETRACE_TRAINING_WEIGHT_MAX", bounds.max)?,
                })
            },
        };
        config.validate()
    }

    /// Check every field, returning the configuration unchanged when valid.
    pub fn validate(self) -> Result<Self> {
        if self.epochs == 0 {
            return Err(SignalError::config("epochs must be positive"));
        }
        if self.batch_size == 0 {
            return Err(SignalError::config("batch_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.target_accuracy) {
            return Err(SignalError::config(format!(
                "target_accuracy must be within [0, 1], got {}",
                self.target_accuracy
            )));
        }
        if self.window_size < 3 {
            return Err(SignalError::config("window_size must cover at least 3 samples"));
        }
        if let Some(bounds) = self.weight_bounds {
            if !(bounds.min > 0.0 && bounds.max >= bounds.min && bounds.max.is_finite()) {
                return Err(SignalError::config(format!(
                    "weight bounds must satisfy 0 < min <= max, got [{}, {}]",
                    bounds.min, bounds.max
                )));
            }
        }
        Ok(self)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| {
                SignalError::config(format!("{} has unparsable value {:?}", key, raw))
            }),
        Err(_) => Ok(default),
    }
}
