//! Z-score Detection
//!
//! Z-スコア法による外れ値検知

use crate::analytics::is_negligible_spread;
use crate::analytics::types::{AnomalyRecord, Severity, StatisticalSummary, TimeSeriesPoint};

/// Z-スコアが閾値を超える点を検出
///
/// `deviation = |value - mean| / σ`, flagged when strictly above `threshold`.
/// A series without dispersion relative to its mean yields no anomalies.
pub(crate) fn detect(
    points: &[TimeSeriesPoint],
    summary: &StatisticalSummary,
    threshold: f64,
) -> Vec<AnomalyRecord> {
    let std_dev = summary.standard_deviation;
    if is_negligible_spread(std_dev, summary.mean) {
        tracing::debug!("zscore: zero variance, skipping");
        return Vec::new();
    }

    points
        .iter()
        .filter_map(|p| {
            let z_score = ((p.value - summary.mean) / std_dev).abs();
            if z_score <= threshold || !z_score.is_finite() {
                return None;
            }

            Some(AnomalyRecord {
                timestamp: p.timestamp,
                value: p.value,
                expected_value: summary.mean,
                deviation: z_score,
                severity: Severity::from_ratio(z_score / threshold),
                description: format!(
                    "Z-score {:.2} exceeds threshold {:.2} (mean {:.3}, σ {:.3})",
                    z_score, threshold, summary.mean, std_dev
                ),
            })
        })
        .collect()
}
