//! Bollinger Bands indicator.

use super::Indicator;
use crate::types::BollingerValue;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the population standard deviation of the same window.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

/// Population standard deviation around `mean`.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance: f64 =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

impl Indicator for BollingerBands {
    type Output = BollingerValue;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, values: &[f64]) -> Option<BollingerValue> {
        if self.period == 0 || values.len() < self.period {
            return None;
        }

        let window = &values[values.len() - self.period..];
        let middle = window.iter().sum::<f64>() / self.period as f64;
        let band = self.std_dev_multiplier * std_dev(window, middle);

        Some(BollingerValue {
            upper: middle + band,
            middle,
            lower: middle - band,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let bands = BollingerBands::default().calculate(&[10.0; 20]).unwrap();
        assert_eq!(bands.upper, 10.0);
        assert_eq!(bands.middle, 10.0);
        assert_eq!(bands.lower, 10.0);
    }

    #[test]
    fn test_bollinger_population_std_dev() {
        // mean 5, population std dev 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = BollingerBands::new(8, 2.0).calculate(&values).unwrap();
        assert!((bands.middle - 5.0).abs() < 1e-12);
        assert!((bands.upper - 9.0).abs() < 1e-12);
        assert!((bands.lower - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_insufficient_data() {
        assert!(BollingerBands::default().calculate(&[1.0; 19]).is_none());
    }
}
