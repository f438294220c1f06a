//! Dixon's Q Test
//!
//! 小標本向けのディクソンQ検定

use crate::analytics::is_negligible_spread;
use crate::analytics::types::{AnomalyRecord, Severity, TimeSeriesPoint};

/// Largest sample the critical value table covers
pub(crate) const MAX_SAMPLE_SIZE: usize = 30;

/// r10 critical values at 95% confidence for n = 3..=30 (Rorabacher, 1991)
const Q95: [f64; 28] = [
    0.970, 0.829, 0.710, 0.625, 0.568, 0.526, 0.493, 0.466, 0.444, 0.426, 0.410, 0.396, 0.384,
    0.374, 0.365, 0.356, 0.349, 0.342, 0.337, 0.331, 0.326, 0.321, 0.317, 0.312, 0.308, 0.305,
    0.301, 0.298,
];

/// 標本サイズに対応する臨界値
pub(crate) fn critical_value(n: usize) -> Option<f64> {
    if !(3..=MAX_SAMPLE_SIZE).contains(&n) {
        return None;
    }
    Q95.get(n - 3).copied()
}

/// 両端の値を検定
///
/// Samples larger than the table yield no anomalies.
pub(crate) fn detect(points: &[TimeSeriesPoint]) -> Vec<AnomalyRecord> {
    let n = points.len();
    let Some(q_crit) = critical_value(n) else {
        tracing::debug!(n, "dixon: sample size outside table, skipping");
        return Vec::new();
    };

    let mut ordered: Vec<&TimeSeriesPoint> = points.iter().collect();
    ordered.sort_by(|a, b| a.value.total_cmp(&b.value));

    let (lowest, highest) = (ordered[0].value, ordered[n - 1].value);
    let range = highest - lowest;
    if is_negligible_spread(range, lowest.abs().max(highest.abs())) {
        return Vec::new();
    }

    let candidates = [
        (ordered[0], ordered[1], "low"),
        (ordered[n - 1], ordered[n - 2], "high"),
    ];

    let mut anomalies: Vec<AnomalyRecord> = candidates
        .iter()
        .filter_map(|(extreme, neighbor, side)| {
            let gap = (extreme.value - neighbor.value).abs();
            let q = gap / range;
            if q <= q_crit {
                return None;
            }

            Some(AnomalyRecord {
                timestamp: extreme.timestamp,
                value: extreme.value,
                expected_value: neighbor.value,
                deviation: q,
                severity: Severity::from_ratio(q / q_crit),
                description: format!(
                    "Dixon Q={:.3} for {} extreme exceeds critical value {:.3} (n={})",
                    q, side, q_crit, n
                ),
            })
        })
        .collect();

    anomalies.sort_by_key(|a| a.timestamp);
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::series;

    #[test]
    fn test_critical_table_bounds() {
        assert_eq!(critical_value(2), None);
        assert_eq!(critical_value(3), Some(0.970));
        assert_eq!(critical_value(10), Some(0.466));
        assert_eq!(critical_value(30), Some(0.298));
        assert_eq!(critical_value(31), None);
    }

    #[test]
    fn test_flags_high_extreme() {
        let points = series(&[1.0, 1.1, 1.2, 1.15, 1.05, 3.0]);
        let anomalies = detect(&points);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, 3.0);
        assert_eq!(anomalies[0].expected_value, 1.2);
        assert!((anomalies[0].deviation - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_borderline_not_flagged() {
        let points = series(&[
            0.189, 0.167, 0.187, 0.183, 0.186, 0.182, 0.181, 0.184, 0.181, 0.177,
        ]);
        // Q(0.167) = 0.010 / 0.022 ≈ 0.455 < 0.466
        assert!(detect(&points).is_empty());
    }

    #[test]
    fn test_large_and_constant_samples() {
        let values: Vec<f64> = (0..40).map(|i| i as f64).chain([1000.0]).collect();
        assert!(detect(&series(&values)).is_empty());
        assert!(detect(&series(&[7.0; 5])).is_empty());
        assert!(detect(&series(&[98.6; 12])).is_empty());
    }
}
