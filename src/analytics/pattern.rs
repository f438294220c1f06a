//! Pattern Change Detection
//!
//! 隣接ウィンドウ間の分布変化を検知

use super::types::{AnomalyRecord, Severity, StatisticalSummary, TimeSeriesPoint};
use super::validation::{SampleSet, ValidationPolicy};
use super::{ensure_positive, is_negligible_spread, tumbling_windows};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Documented minimum series length for pattern analysis
pub const MIN_PATTERN_POINTS: usize = 20;

/// パターン変化検知の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    /// ウィンドウサイズ（既定 10）
    pub window_size: usize,
    /// 正規化シフトの閾値（既定 1.5）
    pub sensitivity_threshold: f64,
    /// 平均値の最小変化率 %（既定 10）
    pub min_change_percent: f64,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            window_size: 10,
            sensitivity_threshold: 1.5,
            min_change_percent: 10.0,
        }
    }
}

impl PatternOptions {
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 2 {
            return Err(Error::invalid(format!(
                "window_size must be at least 2, got {}",
                self.window_size
            )));
        }
        ensure_positive("sensitivity_threshold", self.sensitivity_threshold)?;
        if !self.min_change_percent.is_finite() || self.min_change_percent < 0.0 {
            return Err(Error::invalid(format!(
                "min_change_percent must be a non-negative number, got {}",
                self.min_change_percent
            )));
        }
        Ok(())
    }

    /// 必要なサンプル数
    pub fn required_points(&self) -> usize {
        MIN_PATTERN_POINTS.max(self.window_size * 2)
    }
}

/// パターン変化を検知
pub fn detect_pattern_changes(
    data: &[TimeSeriesPoint],
    options: &PatternOptions,
) -> Result<Vec<AnomalyRecord>> {
    options.validate()?;
    let set = SampleSet::from_points(data, &ValidationPolicy::default());
    detect_in_sample_set(&set, options)
}

pub(crate) fn detect_in_sample_set(
    set: &SampleSet,
    options: &PatternOptions,
) -> Result<Vec<AnomalyRecord>> {
    set.require("pattern-change", options.required_points())?;

    let points = set.points();
    let values = set.values();
    let windows: Vec<_> = tumbling_windows(values.len(), options.window_size).collect();

    let mut changes = Vec::new();
    for pair in windows.windows(2) {
        let (before, after) = (pair[0].clone(), pair[1].clone());
        let (Some(prev), Some(next)) = (
            StatisticalSummary::from_values(&values[before]),
            StatisticalSummary::from_values(&values[after.clone()]),
        ) else {
            continue;
        };

        let Some(shift) = evaluate_shift(&prev, &next, options) else {
            continue;
        };

        let boundary = &points[after.start];
        changes.push(AnomalyRecord {
            timestamp: boundary.timestamp,
            value: boundary.value,
            expected_value: prev.mean,
            deviation: shift.normalized,
            severity: Severity::from_ratio(shift.normalized / options.sensitivity_threshold),
            description: format!(
                "Pattern change: mean {:.3} → {:.3} ({:+.1}%), shift {:.2} pooled σ",
                prev.mean, next.mean, shift.percent, shift.normalized
            ),
        });
    }

    tracing::debug!(
        points = points.len(),
        windows = windows.len(),
        changes = changes.len(),
        "pattern change detection"
    );

    Ok(changes)
}

struct MeanShift {
    percent: f64,
    normalized: f64,
}

/// 平均変化率と正規化シフトの両方が閾値を超えた場合のみ Some
fn evaluate_shift(
    prev: &StatisticalSummary,
    next: &StatisticalSummary,
    options: &PatternOptions,
) -> Option<MeanShift> {
    let diff = next.mean - prev.mean;
    let pooled = ((prev.standard_deviation.powi(2) + next.standard_deviation.powi(2)) / 2.0).sqrt();
    // 両ウィンドウとも一定値なら正規化できない
    if is_negligible_spread(pooled, prev.mean.abs().max(next.mean.abs())) {
        return None;
    }

    let normalized = diff.abs() / pooled;
    if normalized <= options.sensitivity_threshold || !normalized.is_finite() {
        return None;
    }

    // 基準平均が 0 のとき、変化があれば変化率条件は満たすとみなす
    let percent_met = if prev.mean == 0.0 {
        diff != 0.0
    } else {
        (diff / prev.mean).abs() * 100.0 > options.min_change_percent
    };
    if !percent_met {
        return None;
    }

    let percent = if prev.mean == 0.0 {
        100.0 * diff.signum()
    } else {
        diff / prev.mean.abs() * 100.0
    };

    Some(MeanShift {
        percent,
        normalized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{jitter, series};

    fn step_series() -> Vec<TimeSeriesPoint> {
        let values: Vec<f64> = (0..80)
            .map(|i| (if i < 40 { 50.0 } else { 80.0 }) + jitter(i, 2.0))
            .collect();
        series(&values)
    }

    #[test]
    fn test_detects_step_at_boundary() {
        let data = step_series();
        let options = PatternOptions {
            window_size: 10,
            sensitivity_threshold: 1.5,
            min_change_percent: 10.0,
        };

        let changes = detect_pattern_changes(&data, &options).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].timestamp, data[40].timestamp);
        assert!((changes[0].expected_value - 50.0).abs() < 2.0);
        assert_eq!(changes[0].severity, Severity::High);
    }

    #[test]
    fn test_requires_twenty_points() {
        let data = series(&[1.0; 19]);
        let err = detect_pattern_changes(&data, &PatternOptions::default()).unwrap_err();
        assert_eq!(err.required_points(), Some(20));
        assert!(err.to_string().contains("20"));
    }

    #[test]
    fn test_window_size_raises_minimum() {
        let data = series(&[1.0; 30]);
        let options = PatternOptions {
            window_size: 20,
            ..PatternOptions::default()
        };
        let err = detect_pattern_changes(&data, &options).unwrap_err();
        assert_eq!(err.required_points(), Some(40));
    }

    #[test]
    fn test_invalid_options() {
        let data = step_series();
        for options in [
            PatternOptions { window_size: 0, ..PatternOptions::default() },
            PatternOptions { sensitivity_threshold: 0.0, ..PatternOptions::default() },
            PatternOptions { min_change_percent: -1.0, ..PatternOptions::default() },
        ] {
            assert!(matches!(
                detect_pattern_changes(&data, &options),
                Err(Error::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_constant_series_has_no_changes() {
        let data = series(&[42.0; 40]);
        assert!(detect_pattern_changes(&data, &PatternOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_step_between_flat_levels_ignores_rounding() {
        // 42 and 80 are exact; 98.6, 120.3 and 55.3 leave rounding residue in a naive σ
        for (before, after) in [(42.0, 80.0), (98.6, 120.3), (55.3, 98.6)] {
            let values: Vec<f64> = (0..40).map(|i| if i < 20 { before } else { after }).collect();
            let changes = detect_pattern_changes(&series(&values), &PatternOptions::default()).unwrap();
            assert!(changes.is_empty(), "{} -> {}: {:?}", before, after, changes);
        }
    }

    #[test]
    fn test_residual_pooled_sigma_is_zero() {
        let flat = |mean: f64, residue: f64| StatisticalSummary {
            mean,
            median: mean,
            standard_deviation: residue,
            mad: 0.0,
        };
        let options = PatternOptions::default();
        assert!(evaluate_shift(&flat(98.6, 1.4e-14), &flat(120.3, 0.0), &options).is_none());
        assert!(evaluate_shift(&flat(42.0, 0.0), &flat(80.0, 0.0), &options).is_none());
        assert!(evaluate_shift(&flat(42.0, 1.0), &flat(80.0, 1.0), &options).is_some());
    }

    #[test]
    fn test_min_change_percent_gates_small_shifts() {
        // 1000 → 1010 is a large shift in σ units but only 1%
        let values: Vec<f64> = (0..40)
            .map(|i| (if i < 20 { 1000.0 } else { 1010.0 }) + jitter(i, 0.5))
            .collect();
        let data = series(&values);

        let strict = PatternOptions {
            min_change_percent: 5.0,
            ..PatternOptions::default()
        };
        assert!(detect_pattern_changes(&data, &strict).unwrap().is_empty());

        let loose = PatternOptions {
            min_change_percent: 0.5,
            ..PatternOptions::default()
        };
        assert_eq!(detect_pattern_changes(&data, &loose).unwrap().len(), 1);
    }
}
