//! Analytics Module
//!
//! ヒストリアン時系列の異常・パターン変化検知エンジン

pub mod advanced;
pub mod anomaly;
pub mod flagger;
pub mod pattern;
pub mod statistics;
pub mod trend;
pub mod types;
pub mod validation;

pub use advanced::{detect_advanced_anomalies, AdvancedOptions};
pub use anomaly::{
    detect_anomalies, detect_dixon, detect_grubbs, detect_iqr, detect_modified_zscore,
    parse_methods, perform_statistical_deviation_analysis,
    perform_statistical_deviation_analysis_with_options, DeviationAnalysisOptions, IqrFences,
};
pub use flagger::{flag_anomalies, FlagThresholds};
pub use pattern::{detect_pattern_changes, PatternOptions};
pub use trend::{detect_significant_trend_changes, TrendOptions};
pub use types::{
    AnomalyRecord, AnomalySummary, DetectionTag, FlagReport, MethodResult, Quality, Severity,
    StatisticalMethod, StatisticalSummary, TimeSeriesPoint,
};
pub use validation::{SampleSet, ValidationPolicy};

use crate::error::{Error, Result};
use std::ops::Range;

/// 正の有限値であることを検査
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid(format!(
            "{} must be a positive number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// 開区間 (0, 1) にあることを検査
pub(crate) fn ensure_probability(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(Error::invalid(format!(
            "{} must lie strictly between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Spread at or below this fraction of the data's magnitude counts as zero
const RELATIVE_SPREAD_TOLERANCE: f64 = 1e-12;

/// 散らばりが実質ゼロかを判定
///
/// `spread` (σ, MAD, IQR or range) is compared against `magnitude`, the
/// typical absolute level of the same data. Rounding residue from a constant
/// series is always negligible; NaN counts as negligible.
pub(crate) fn is_negligible_spread(spread: f64, magnitude: f64) -> bool {
    !(spread > RELATIVE_SPREAD_TOLERANCE * magnitude.abs())
}

/// Adjacent non-overlapping windows of `size`; a trailing partial window is dropped.
pub(crate) fn tumbling_windows(len: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    let count = if size == 0 { 0 } else { len / size };
    (0..count).map(move |i| i * size..(i + 1) * size)
}

/// 候補を統合
///
/// Records sharing `(timestamp, value)` collapse into one, keeping the most
/// severe (then the largest deviation). The result is sorted by timestamp.
pub(crate) fn merge_anomalies(mut candidates: Vec<AnomalyRecord>) -> Vec<AnomalyRecord> {
    candidates.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.value.total_cmp(&b.value))
    });

    candidates.dedup_by(|later, kept| {
        if later.timestamp != kept.timestamp || later.value.to_bits() != kept.value.to_bits() {
            return false;
        }
        let stronger = later.severity > kept.severity
            || (later.severity == kept.severity && later.deviation > kept.deviation);
        if stronger {
            std::mem::swap(later, kept);
        }
        true
    });

    candidates
}


#[cfg(test)]
mod tests {
    use super::test_support::series;
    use super::*;

    fn record(point: &TimeSeriesPoint, severity: Severity, deviation: f64) -> AnomalyRecord {
        AnomalyRecord {
            timestamp: point.timestamp,
            value: point.value,
            expected_value: 0.0,
            deviation,
            severity,
            description: format!("{:?}", severity),
        }
    }

    #[test]
    fn test_merge_dedups_and_sorts() {
        let points = series(&[1.0, 2.0, 3.0]);
        let merged = merge_anomalies(vec![
            record(&points[2], Severity::Low, 1.0),
            record(&points[0], Severity::Low, 1.0),
            record(&points[2], Severity::High, 5.0),
            record(&points[0], Severity::Low, 2.0),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].timestamp, points[0].timestamp);
        assert_eq!(merged[0].deviation, 2.0);
        assert_eq!(merged[1].severity, Severity::High);
    }

    #[test]
    fn test_same_timestamp_different_value_kept() {
        let mut points = series(&[1.0, 2.0]);
        points[1].timestamp = points[0].timestamp;
        let merged = merge_anomalies(vec![
            record(&points[1], Severity::Low, 1.0),
            record(&points[0], Severity::Low, 1.0),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].value, 1.0);
    }

    #[test]
    fn test_tumbling_windows() {
        let windows: Vec<_> = tumbling_windows(25, 10).collect();
        assert_eq!(windows, vec![0..10, 10..20]);
        assert_eq!(tumbling_windows(5, 0).count(), 0);
    }

    #[test]
    fn test_guards() {
        assert!(ensure_positive("t", 1.0).is_ok());
        assert!(ensure_positive("t", 0.0).is_err());
        assert!(ensure_positive("t", f64::NAN).is_err());
        assert!(ensure_positive("t", f64::INFINITY).is_err());
        assert!(ensure_probability("a", 0.05).is_ok());
        assert!(ensure_probability("a", 1.0).is_err());
        assert!(ensure_probability("a", f64::NAN).is_err());
    }

    #[test]
    fn test_negligible_spread_is_scale_relative() {
        assert!(is_negligible_spread(0.0, 0.0));
        assert!(is_negligible_spread(1.4e-14, 98.6));
        assert!(is_negligible_spread(f64::NAN, 1.0));
        assert!(!is_negligible_spread(1e-20, 1e-15));
        assert!(!is_negligible_spread(0.5, 98.6));
        assert!(!is_negligible_spread(1e-9, 0.0));
    }
}
