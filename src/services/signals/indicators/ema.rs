//! Exponential Moving Average (EMA) indicator.

use super::Indicator;

/// EMA (Exponential Moving Average) indicator.
///
/// Smoothing factor `2 / (period + 1)`, seeded with the first value of the
/// window rather than an SMA, so `Ema::new(1)` reproduces its input.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Run the recurrence over `values` without the minimum-length check.
    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let alpha = self.alpha();
        let mut out = Vec::with_capacity(values.len());
        let mut iter = values.iter();
        let Some(&first) = iter.next() else {
            return out;
        };

        let mut ema = first;
        out.push(ema);
        for &value in iter {
            ema = value * alpha + ema * (1.0 - alpha);
            out.push(ema);
        }
        out
    }

    /// EMA at every index, or `None` with fewer than `period` values.
    pub fn series(&self, values: &[f64]) -> Option<Vec<f64>> {
        if self.period == 0 || values.len() < self.period {
            return None;
        }
        Some(self.smooth(values))
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn id(&self) -> &str {
        match self.period {
            12 => "ema12",
            26 => "ema26",
            _ => "ema",
        }
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, values: &[f64]) -> Option<f64> {
        self.series(values)?.last().copied()
    }
}
