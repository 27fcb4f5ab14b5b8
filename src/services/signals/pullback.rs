//! Peak/valley detection and pullback (retracement) measurement.

use crate::config::{SignalConfig, TrendThresholds};
use crate::types::{Extremum, ExtremumKind, Pullback, PullbackAnalysis, Trend};

/// Strict local extrema in one pass, returned as `(peaks, valleys)`.
///
/// The first and last points are never extrema, and plateaus never qualify.
pub fn find_extrema(prices: &[f64]) -> (Vec<Extremum>, Vec<Extremum>) {
    let mut peaks = Vec::new();
    let mut valleys = Vec::new();

    for (offset, triple) in prices.windows(3).enumerate() {
        let (prev, current, next) = (triple[0], triple[1], triple[2]);
        let index = offset + 1;
        if current > prev && current > next {
            peaks.push(Extremum {
                index,
                price: current,
                kind: ExtremumKind::Peak,
            });
        } else if current < prev && current < next {
            valleys.push(Extremum {
                index,
                price: current,
                kind: ExtremumKind::Valley,
            });
        }
    }

    (peaks, valleys)
}

/// Pair each peak with the next one and the lowest valley strictly between.
///
/// Equal-priced valleys resolve to the earliest. Peak pairs with no valley
/// between them, or whose valley is not below the first peak, yield nothing.
pub fn identify_pullbacks(peaks: &[Extremum], valleys: &[Extremum]) -> Vec<Pullback> {
    peaks
        .windows(2)
        .filter_map(|pair| {
            let (peak, next_peak) = (pair[0], pair[1]);
            let valley = valleys
                .iter()
                .filter(|v| v.index > peak.index && v.index < next_peak.index)
                .fold(None::<Extremum>, |lowest, v| match lowest {
                    Some(low) if low.price <= v.price => Some(low),
                    _ => Some(*v),
                })?;

            if valley.price <= 0.0 || valley.price >= peak.price {
                return None;
            }

            let depth = (peak.price - valley.price) / peak.price;
            let recovery = (next_peak.price - valley.price) / valley.price;
            Some(Pullback {
                peak,
                valley,
                next_peak,
                depth,
                recovery,
                strength: depth * recovery,
                recovery_ratio: (next_peak.price - valley.price) / (peak.price - valley.price),
            })
        })
        .collect()
}

/// Bucket the whole-window change `(last - first) / first`.
pub fn classify_trend(prices: &[f64], thresholds: &TrendThresholds) -> Trend {
    let (Some(&first), Some(&last)) = (prices.first(), prices.last()) else {
        return Trend::Sideways;
    };
    if first <= 0.0 {
        return Trend::Sideways;
    }

    let change = (last - first) / first;
    if change > thresholds.strong {
        Trend::StrongUptrend
    } else if change > thresholds.normal {
        Trend::Uptrend
    } else if change < -thresholds.strong {
        Trend::StrongDowntrend
    } else if change < -thresholds.normal {
        Trend::Downtrend
    } else {
        Trend::Sideways
    }
}

/// Analyse the trailing `pullback_analysis_depth` prices.
///
/// Extremum indices are relative to that trailing slice.
pub fn analyze_pullbacks(prices: &[f64], config: &SignalConfig) -> PullbackAnalysis {
    let start = prices.len().saturating_sub(config.pullback_analysis_depth);
    let window = &prices[start..];

    let (peaks, valleys) = find_extrema(window);
    let pullbacks = identify_pullbacks(&peaks, &valleys);
    let trend = classify_trend(window, &config.trend);

    let (average_depth, average_recovery) = if pullbacks.is_empty() {
        (0.0, 0.0)
    } else {
        let n = pullbacks.len() as f64;
        (
            pullbacks.iter().map(|p| p.depth).sum::<f64>() / n,
            pullbacks.iter().map(|p| p.recovery).sum::<f64>() / n,
        )
    };

    let has_valid_pullback = !pullbacks.is_empty() && average_depth > config.pullback_min_depth;

    PullbackAnalysis {
        peaks,
        valleys,
        pullbacks,
        trend,
        average_depth,
        average_recovery,
        has_valid_pullback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_never_extrema() {
        let (peaks, valleys) = find_extrema(&[5.0, 1.0, 5.0]);
        assert!(peaks.is_empty());
        assert_eq!(valleys.len(), 1);
        assert_eq!(valleys[0].index, 1);

        let (peaks, valleys) = find_extrema(&[9.0, 1.0]);
        assert!(peaks.is_empty() && valleys.is_empty());
    }

    #[test]
    fn test_plateaus_are_not_extrema() {
        let (peaks, valleys) = find_extrema(&[1.0, 3.0, 3.0, 1.0, 1.0, 2.0]);
        assert!(peaks.is_empty());
        assert!(valleys.is_empty());
    }

    #[test]
    fn test_extrema_idempotent_and_disjoint() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.9).sin() * 3.0).collect();
        let first = find_extrema(&prices);
        let second = find_extrema(&prices);
        assert_eq!(first, second);

        let (peaks, valleys) = first;
        assert!(!peaks.is_empty() && !valleys.is_empty());
        for peak in &peaks {
            assert!(valleys.iter().all(|v| v.index != peak.index));
        }
    }

    #[test]
    fn test_single_pullback_measurements() {
        let prices = [95.0, 100.0, 98.0, 97.0, 99.0, 101.0, 100.0];
        let (peaks, valleys) = find_extrema(&prices);
        let pullbacks = identify_pullbacks(&peaks, &valleys);

        assert_eq!(pullbacks.len(), 1);
        let pb = pullbacks[0];
        assert_eq!(pb.peak.price, 100.0);
        assert_eq!(pb.valley.price, 97.0);
        assert_eq!(pb.next_peak.price, 101.0);
        assert!((pb.depth - 0.03).abs() < 1e-12);
        assert!((pb.recovery - 4.0 / 97.0).abs() < 1e-12);
        assert!((pb.strength - pb.depth * pb.recovery).abs() < 1e-12);
        assert!((pb.recovery_ratio - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_lowest_valley_between_peaks_wins() {
        // valleys at 97 (index 2) and 96 (index 5) sit between peaks 100 and 102
        let prices = [99.0, 100.0, 97.0, 98.0, 98.0, 96.0, 102.0, 101.0];
        let (peaks, valleys) = find_extrema(&prices);
        assert_eq!(peaks.len(), 2);
        assert_eq!(valleys.len(), 2);

        let pullbacks = identify_pullbacks(&peaks, &valleys);
        assert_eq!(pullbacks.len(), 1);
        assert_eq!(pullbacks[0].valley.index, 5);
        assert_eq!(pullbacks[0].valley.price, 96.0);
    }

    #[test]
    fn test_equal_valleys_pick_earliest() {
        let prices = [99.0, 100.0, 97.0, 98.0, 98.0, 97.0, 102.0, 101.0];
        let (peaks, valleys) = find_extrema(&prices);
        let pullbacks = identify_pullbacks(&peaks, &valleys);
        assert_eq!(pullbacks[0].valley.index, 2);
    }

    #[test]
    fn test_trend_buckets() {
        let thresholds = TrendThresholds::default();
        assert_eq!(classify_trend(&[100.0, 106.0], &thresholds), Trend::StrongUptrend);
        assert_eq!(classify_trend(&[100.0, 103.0], &thresholds), Trend::Uptrend);
        assert_eq!(classify_trend(&[100.0, 101.0], &thresholds), Trend::Sideways);
        assert_eq!(classify_trend(&[100.0, 97.0], &thresholds), Trend::Downtrend);
        assert_eq!(classify_trend(&[100.0, 94.0], &thresholds), Trend::StrongDowntrend);
        assert_eq!(classify_trend(&[], &thresholds), Trend::Sideways);
    }

    #[test]
    fn test_trend_thresholds_are_configurable() {
        let tight = TrendThresholds {
            strong: 0.01,
            normal: 0.005,
        };
        assert_eq!(classify_trend(&[100.0, 101.5], &tight), Trend::StrongUptrend);
    }

    #[test]
    fn test_shallow_pullback_is_not_valid() {
        let prices = [99.0, 100.0, 99.5, 101.0, 100.0];
        let analysis = analyze_pullbacks(&prices, &SignalConfig::default());
        assert_eq!(analysis.pullbacks.len(), 1);
        assert_eq!(analysis.peak_count(), 2);
        assert_eq!(analysis.valley_count(), 1);
        assert!(!analysis.has_valid_pullback);
    }

    #[test]
    fn test_analysis_uses_trailing_depth() {
        // an early deep dip outside the last 20 samples is ignored
        let mut prices = vec![100.0, 110.0, 80.0, 111.0, 100.0];
        prices.extend((0..20).map(|i| 100.0 + i as f64 * 0.1));
        let analysis = analyze_pullbacks(&prices, &SignalConfig::default());
        assert!(analysis.pullbacks.is_empty());
        assert!(!analysis.has_valid_pullback);
        assert_eq!(analysis.average_depth, 0.0);
    }
}
