//! Relative Strength Index (RSI) indicator.

use super::Indicator;

/// RSI (Relative Strength Index) indicator.
///
/// Compares the mean gain to the mean loss over the last `period`
/// transitions. Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// A window with no losses reads 100, including a perfectly flat one.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn calculate(&self, values: &[f64]) -> Option<f64> {
        if self.period == 0 || values.len() < self.min_periods() {
            return None;
        }

        let tail = &values[values.len() - self.min_periods()..];
        let (gains, losses) = tail
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold((0.0, 0.0), |(gains, losses), change| {
                if change > 0.0 {
                    (gains + change, losses)
                } else {
                    (gains, losses - change)
                }
            });

        let avg_gain = gains / self.period as f64;
        let avg_loss = losses / self.period as f64;

        if avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}
