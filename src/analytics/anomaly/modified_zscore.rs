//! Modified Z-score Detection
//!
//! MAD（中央絶対偏差）を用いた頑健な外れ値検知

use crate::analytics::is_negligible_spread;
use crate::analytics::types::{AnomalyRecord, Severity, StatisticalSummary, TimeSeriesPoint};

/// 0.6745 ≈ Φ⁻¹(0.75), makes MAD consistent with σ for normal data
const MAD_CONSISTENCY: f64 = 0.6745;

/// 修正Z-スコアが閾値を超える点を検出
pub(crate) fn detect(
    points: &[TimeSeriesPoint],
    summary: &StatisticalSummary,
    threshold: f64,
) -> Vec<AnomalyRecord> {
    let mad = summary.mad;
    if is_negligible_spread(mad, summary.median) {
        tracing::debug!("modified-zscore: MAD is zero, skipping");
        return Vec::new();
    }

    points
        .iter()
        .filter_map(|p| {
            let modified_z = MAD_CONSISTENCY * (p.value - summary.median) / mad;
            let deviation = modified_z.abs();
            if deviation <= threshold || !deviation.is_finite() {
                return None;
            }

            Some(AnomalyRecord {
                timestamp: p.timestamp,
                value: p.value,
                expected_value: summary.median,
                deviation,
                severity: Severity::from_ratio(deviation / threshold),
                description: format!(
                    "Modified Z-score {:.2} exceeds threshold {:.2} (median {:.3}, MAD {:.3})",
                    modified_z, threshold, summary.median, mad
                ),
            })
        })
        .collect()
}
