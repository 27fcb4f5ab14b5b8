//! MACD (Moving Average Convergence Divergence) indicator.

use super::{Ema, Indicator};
use crate::types::MacdValue;

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) applied to the latest MACD value alone
/// - Histogram = MACD Line - Signal Line
///
/// The signal line is a one-point smoothing seeded with that point, so it
/// equals the main line and the histogram reads zero.
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        self.slow_period
    }

    fn calculate(&self, values: &[f64]) -> Option<MacdValue> {
        let fast = Ema::new(self.fast_period).calculate(values)?;
        let slow = Ema::new(self.slow_period).calculate(values)?;
        let main = fast - slow;

        let signal = *Ema::new(self.signal_period).smooth(&[main]).last()?;

        Some(MacdValue {
            main,
            signal,
            histogram: main - signal,
        })
    }
}
