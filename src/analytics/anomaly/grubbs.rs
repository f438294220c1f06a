//! Grubbs' Test
//!
//! 単一外れ値に対するグラブス検定

use crate::analytics::is_negligible_spread;
use crate::analytics::types::{AnomalyRecord, Severity, StatisticalSummary, TimeSeriesPoint};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// 両側グラブス検定の臨界値
///
/// `G_crit = (N-1)/√N · √(t² / (N-2+t²))` where `t` is the upper `α/(2N)`
/// quantile of Student's t with `N-2` degrees of freedom.
pub(crate) fn critical_value(n: usize, alpha: f64) -> Option<f64> {
    if n < 3 {
        return None;
    }

    let n_f = n as f64;
    let t_dist = StudentsT::new(0.0, 1.0, n_f - 2.0).ok()?;
    let t = t_dist.inverse_cdf(1.0 - alpha / (2.0 * n_f));
    if !t.is_finite() {
        return None;
    }

    let t_sq = t * t;
    Some((n_f - 1.0) / n_f.sqrt() * (t_sq / (n_f - 2.0 + t_sq)).sqrt())
}

/// 最大偏差点を検定
///
/// Flags at most one point. An explicit `threshold` raises the cutoff above
/// the critical value when it is larger.
pub(crate) fn detect(
    points: &[TimeSeriesPoint],
    summary: &StatisticalSummary,
    alpha: f64,
    threshold: Option<f64>,
) -> Vec<AnomalyRecord> {
    let n = points.len();
    let sample_std = summary.sample_standard_deviation(n);
    if is_negligible_spread(sample_std, summary.mean) {
        return Vec::new();
    }

    let Some(candidate) = points.iter().max_by(|a, b| {
        (a.value - summary.mean)
            .abs()
            .total_cmp(&(b.value - summary.mean).abs())
    }) else {
        return Vec::new();
    };

    let Some(g_crit) = critical_value(n, alpha) else {
        tracing::debug!(n, alpha, "grubbs: critical value unavailable");
        return Vec::new();
    };

    let g = (candidate.value - summary.mean).abs() / sample_std;
    let cutoff = threshold.map_or(g_crit, |t| t.max(g_crit));

    tracing::debug!(n, g, g_crit, "grubbs statistic");

    if g <= cutoff || !g.is_finite() {
        return Vec::new();
    }

    vec![AnomalyRecord {
        timestamp: candidate.timestamp,
        value: candidate.value,
        expected_value: summary.mean,
        deviation: g,
        severity: Severity::from_ratio(g / cutoff),
        description: format!(
            "Grubbs statistic G={:.3} exceeds critical value {:.3} (α={}, n={})",
            g, g_crit, alpha, n
        ),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::series;

    #[test]
    fn test_critical_value_matches_table() {
        // Published two-sided values at α = 0.05
        let g10 = critical_value(10, 0.05).unwrap();
        assert!((g10 - 2.290).abs() < 0.01, "g10 = {}", g10);
        let g20 = critical_value(20, 0.05).unwrap();
        assert!((g20 - 2.709).abs() < 0.01, "g20 = {}", g20);
        assert!(critical_value(2, 0.05).is_none());
    }

    #[test]
    fn test_flags_single_outlier() {
        let values = [
            199.31, 199.53, 200.19, 200.82, 201.92, 201.95, 202.18, 245.57,
        ];
        let points = series(&values);
        let summary = StatisticalSummary::from_values(&values).unwrap();

        let anomalies = detect(&points, &summary, 0.05, None);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, 245.57);
        assert_eq!(anomalies[0].expected_value, summary.mean);
    }

    #[test]
    fn test_threshold_raises_cutoff() {
        let values = [
            199.31, 199.53, 200.19, 200.82, 201.92, 201.95, 202.18, 245.57,
        ];
        let points = series(&values);
        let summary = StatisticalSummary::from_values(&values).unwrap();

        assert!(detect(&points, &summary, 0.05, Some(10.0)).is_empty());
    }

    #[test]
    fn test_small_and_constant_samples() {
        let values = [1.0, 1.0, 1.0];
        let summary = StatisticalSummary::from_values(&values).unwrap();
        assert!(detect(&series(&values), &summary, 0.05, None).is_empty());

        let values = [1234.567; 20];
        let summary = StatisticalSummary::from_values(&values).unwrap();
        assert!(detect(&series(&values), &summary, 0.05, Some(0.5)).is_empty());

        // Evenly spread: G = 1.0, well below G_crit(3) ≈ 1.154
        let values = [1.0, 50.5, 100.0];
        let summary = StatisticalSummary::from_values(&values).unwrap();
        assert!(detect(&series(&values), &summary, 0.05, None).is_empty());
    }
}
