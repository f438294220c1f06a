//! Advanced Multi-Algorithm Detection
//!
//! Z-スコア・IQR・トレンド分析を組み合わせた異常検知

use super::anomaly::{iqr_kernel, zscore_kernel};
use super::trend::{self, TrendOptions};
use super::types::{AnomalyRecord, StatisticalSummary, TimeSeriesPoint};
use super::validation::{SampleSet, ValidationPolicy};
use super::{ensure_positive, merge_anomalies};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Absolute minimum series length for the advanced pass
pub const MIN_ADVANCED_POINTS: usize = 10;

/// 複合検知の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedOptions {
    /// Z-スコア閾値（既定 2.5）
    pub statistical_threshold: f64,
    /// IQR 乗数（既定 1.5）
    pub iqr_multiplier: f64,
    /// トレンド分析を有効化
    pub enable_trend_analysis: bool,
    /// ウィンドウサイズ（既定 10）
    pub window_size: usize,
    /// トレンド分析の傾き閾値（既定 1.0）
    pub trend_threshold: f64,
    /// トレンド分析のボラティリティ比閾値（既定 3.0）
    pub volatility_threshold: f64,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            statistical_threshold: 2.5,
            iqr_multiplier: 1.5,
            enable_trend_analysis: true,
            window_size: 10,
            trend_threshold: 1.0,
            volatility_threshold: 3.0,
        }
    }
}

impl AdvancedOptions {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("statistical_threshold", self.statistical_threshold)?;
        ensure_positive("iqr_multiplier", self.iqr_multiplier)?;
        if self.window_size == 0 {
            return Err(Error::invalid("window_size must be positive"));
        }
        if self.enable_trend_analysis {
            self.trend_options().validate()?;
        }
        Ok(())
    }

    /// 必要なサンプル数
    pub fn required_points(&self) -> usize {
        MIN_ADVANCED_POINTS.max(self.window_size * 2)
    }

    fn trend_options(&self) -> TrendOptions {
        TrendOptions {
            window_size: self.window_size,
            trend_threshold: self.trend_threshold,
            volatility_threshold: self.volatility_threshold,
        }
    }
}

/// 複合アルゴリズムによる異常検知
pub fn detect_advanced_anomalies(
    data: &[TimeSeriesPoint],
    options: &AdvancedOptions,
) -> Result<Vec<AnomalyRecord>> {
    options.validate()?;
    let set = SampleSet::from_points(data, &ValidationPolicy::default());
    detect_in_sample_set(&set, options)
}

pub(crate) fn detect_in_sample_set(
    set: &SampleSet,
    options: &AdvancedOptions,
) -> Result<Vec<AnomalyRecord>> {
    set.require("advanced-multi-algorithm", options.required_points())?;

    let summary = StatisticalSummary::from_values(&set.values())
        .ok_or_else(|| Error::insufficient("advanced-multi-algorithm", options.required_points(), 0))?;

    let mut candidates = zscore_kernel(set, &summary, options.statistical_threshold);
    candidates.extend(iqr_kernel(set, options.iqr_multiplier));

    if options.enable_trend_analysis {
        let trend_options = options.trend_options();
        if set.len() >= trend_options.required_points() {
            candidates.extend(trend::detect_in_sample_set(set, &trend_options)?);
        } else {
            tracing::debug!(
                points = set.len(),
                required = trend_options.required_points(),
                "advanced: not enough data for trend analysis, skipping"
            );
        }
    }

    let merged = merge_anomalies(candidates);
    tracing::debug!(points = set.len(), anomalies = merged.len(), "advanced detection");
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{jitter, series};

    #[test]
    fn test_merges_zscore_and_iqr_without_duplicates() {
        let mut values: Vec<f64> = (0..40).map(|i| 20.0 + jitter(i, 1.0)).collect();
        values[25] = 60.0;
        let data = series(&values);

        let options = AdvancedOptions {
            enable_trend_analysis: false,
            ..AdvancedOptions::default()
        };
        let anomalies = detect_advanced_anomalies(&data, &options).unwrap();

        // Both Z-score and IQR flag the spike; it must appear once
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].timestamp, data[25].timestamp);
    }

    #[test]
    fn test_minimum_is_max_of_ten_and_two_windows() {
        let data = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let err = detect_advanced_anomalies(&data, &AdvancedOptions::default()).unwrap_err();
        assert_eq!(err.required_points(), Some(20));

        let options = AdvancedOptions {
            window_size: 3,
            ..AdvancedOptions::default()
        };
        let err = detect_advanced_anomalies(&data, &options).unwrap_err();
        assert_eq!(err.required_points(), Some(10));
    }

    #[test]
    fn test_trend_analysis_contributes() {
        let values: Vec<f64> = (0..60)
            .map(|i| if i < 30 { i as f64 } else { 60.0 - i as f64 })
            .collect();
        let data = series(&values);

        let with_trend = detect_advanced_anomalies(&data, &AdvancedOptions::default()).unwrap();
        let without_trend = detect_advanced_anomalies(
            &data,
            &AdvancedOptions {
                enable_trend_analysis: false,
                ..AdvancedOptions::default()
            },
        )
        .unwrap();

        assert!(with_trend.len() > without_trend.len());
        for pair in with_trend.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_short_series_skips_trend() {
        // 25 points: enough for the advanced pass (20) but not for trend (30)
        let values: Vec<f64> = (0..25).map(|i| 5.0 + jitter(i, 1.0)).collect();
        assert!(detect_advanced_anomalies(&series(&values), &AdvancedOptions::default()).is_ok());
    }
}
