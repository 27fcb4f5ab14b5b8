//! Technical indicator implementations.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::BollingerBands;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::config::IndicatorConfig;
use crate::types::IndicatorBundle;

/// Trait for implementing technical indicators.
pub trait Indicator: Send + Sync {
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Minimum number of samples required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator over an oldest-first series.
    /// Returns None if there is insufficient data.
    fn calculate(&self, values: &[f64]) -> Option<Self::Output>;
}

/// Compute every indicator for the latest point of a price window.
///
/// Volume-based fields are filled only when `volumes` is given.
pub fn compute_indicators(
    prices: &[f64],
    volumes: Option<&[f64]>,
    config: &IndicatorConfig,
) -> IndicatorBundle {
    let [short, medium, long] = config.sma_periods;

    IndicatorBundle {
        sma_short: Sma::new(short).calculate(prices),
        sma_medium: Sma::new(medium).calculate(prices),
        sma_long: Sma::new(long).calculate(prices),
        ema_fast: Ema::new(config.ema_fast).calculate(prices),
        ema_slow: Ema::new(config.ema_slow).calculate(prices),
        rsi: Rsi::new(config.rsi_period).calculate(prices),
        macd: Macd::new(config.ema_fast, config.ema_slow, config.macd_signal).calculate(prices),
        bollinger: BollingerBands::new(config.bollinger_period, config.bollinger_width)
            .calculate(prices),
        volume_sma: volumes.and_then(|v| Sma::new(config.volume_period).calculate(v)),
    }
}
