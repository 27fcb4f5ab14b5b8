use crate::error::{Result, SignalError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MACD line values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdValue {
    /// Fast EMA minus slow EMA.
    pub main: f64,
    /// Smoothed main line.
    pub signal: f64,
    /// Main minus signal.
    pub histogram: f64,
}

/// Bollinger band values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Indicator values derived from a trailing window.
///
/// `None` always means "not enough data for this period", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorBundle {
    pub sma_short: Option<f64>,
    pub sma_medium: Option<f64>,
    pub sma_long: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    /// Relative strength (0-100).
    pub rsi: Option<f64>,
    pub macd: Option<MacdValue>,
    pub bollinger: Option<BollingerValue>,
    /// Average volume over the volume period.
    pub volume_sma: Option<f64>,
}

/// Open/high/low/close of one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A single time-stamped market snapshot.
///
/// Fields are validated on construction and read through accessors, so a
/// value that exists is always finite and positive-priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawObservation")]
pub struct Observation {
    timestamp: DateTime<Utc>,
    price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    indicators: Option<IndicatorBundle>,
}

/// Unvalidated wire shape of an [`Observation`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObservation {
    timestamp: DateTime<Utc>,
    price: f64,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    indicators: Option<IndicatorBundle>,
}

impl TryFrom<RawObservation> for Observation {
    type Error = SignalError;

    fn try_from(raw: RawObservation) -> Result<Self> {
        let mut observation = Observation::new(raw.timestamp, raw.price)?;
        if let Some(volume) = raw.volume {
            observation = observation.with_volume(volume)?;
        }
        match (raw.open, raw.high, raw.low) {
            (Some(open), Some(high), Some(low)) => {
                observation = observation.with_ohlc(open, high, low)?;
            }
            (None, None, None) => {}
            _ => {
                return Err(SignalError::input(
                    "open, high and low must be given together",
                ))
            }
        }
        if let Some(indicators) = raw.indicators {
            observation = observation.with_indicators(indicators);
        }
        Ok(observation)
    }
}

fn check_price(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SignalError::input(format!(
            "{} must be a finite positive number, got {}",
            name, value
        )))
    }
}

impl Observation {
    /// Create an observation from a timestamp and closing price.
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Result<Self> {
        Ok(Self {
            timestamp,
            price: check_price("price", price)?,
            volume: None,
            open: None,
            high: None,
            low: None,
            indicators: None,
        })
    }

    /// Attach a traded volume.
    pub fn with_volume(mut self, volume: f64) -> Result<Self> {
        if !(volume.is_finite() && volume >= 0.0) {
            return Err(SignalError::input(format!(
                "volume must be a finite non-negative number, got {}",
                volume
            )));
        }
        self.volume = Some(volume);
        Ok(self)
    }

    /// Attach open/high/low; the close is the observation price.
    pub fn with_ohlc(mut self, open: f64, high: f64, low: f64) -> Result<Self> {
        let open = check_price("open", open)?;
        let high = check_price("high", high)?;
        let low = check_price("low", low)?;
        if high < low {
            return Err(SignalError::input(format!(
                "high ({}) is below low ({})",
                high, low
            )));
        }
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        Ok(self)
    }

    /// Attach a precomputed indicator bundle.
    pub fn with_indicators(mut self, indicators: IndicatorBundle) -> Self {
        self.indicators = Some(indicators);
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> Option<f64> {
        self.volume
    }

    pub fn indicators(&self) -> Option<&IndicatorBundle> {
        self.indicators.as_ref()
    }

    /// Full candle, if open/high/low were reported.
    pub fn candle(&self) -> Option<Candle> {
        Some(Candle {
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.price,
        })
    }
}

/// Closing prices of a window, oldest first.
pub fn closes(window: &[Observation]) -> Vec<f64> {
    window.iter().map(Observation::price).collect()
}

/// Volumes of a window, or `None` if any observation lacks one.
pub fn volumes(window: &[Observation]) -> Option<Vec<f64>> {
    window.iter().map(Observation::volume).collect()
}
