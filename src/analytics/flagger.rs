//! Anomaly Flagging
//!
//! 複数の検知器を実行し、重複排除・整列したレポートを生成

use super::advanced::{self, AdvancedOptions};
use super::anomaly::{iqr_kernel, prepare, zscore_kernel};
use super::pattern::{self, PatternOptions};
use super::trend::{self, TrendOptions};
use super::types::{AnomalySummary, DetectionTag, FlagReport, StatisticalSummary, TimeSeriesPoint};
use super::validation::{SampleSet, ValidationPolicy};
use super::{ensure_positive, merge_anomalies};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// `flag_anomalies` の閾値設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    /// Z-スコア閾値（既定 3.0）
    pub statistical_threshold: f64,
    /// IQR 乗数（既定 1.5）
    pub iqr_multiplier: f64,
    /// パターン変化検知を実行
    pub enable_pattern_analysis: bool,
    pub pattern: PatternOptions,
    /// トレンド変化検知を実行
    pub enable_trend_analysis: bool,
    pub trend: TrendOptions,
    /// 複合検知を実行
    pub enable_advanced: bool,
    pub advanced: AdvancedOptions,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            statistical_threshold: 3.0,
            iqr_multiplier: 1.5,
            enable_pattern_analysis: true,
            pattern: PatternOptions::default(),
            enable_trend_analysis: true,
            trend: TrendOptions::default(),
            enable_advanced: false,
            advanced: AdvancedOptions::default(),
        }
    }
}

impl FlagThresholds {
    /// Validates only the stages that are enabled.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("statistical_threshold", self.statistical_threshold)?;
        ensure_positive("iqr_multiplier", self.iqr_multiplier)?;
        if self.enable_pattern_analysis {
            self.pattern.validate()?;
        }
        if self.enable_trend_analysis {
            self.trend.validate()?;
        }
        if self.enable_advanced {
            self.advanced.validate()?;
        }
        Ok(())
    }
}

/// 異常をフラグ付けしてサマリーを生成
///
/// Z-score and IQR always run and need at least three valid points. The
/// windowed stages run only when enabled and when the series is long enough
/// for them; otherwise they are skipped and left out of `detectionMethods`.
pub fn flag_anomalies(data: &[TimeSeriesPoint], thresholds: &FlagThresholds) -> Result<FlagReport> {
    flag_with_policy(data, thresholds, &ValidationPolicy::default())
}

pub(crate) fn flag_with_policy(
    data: &[TimeSeriesPoint],
    thresholds: &FlagThresholds,
    policy: &ValidationPolicy,
) -> Result<FlagReport> {
    thresholds.validate()?;
    let (set, summary) = prepare(data, policy, "statistical-deviation")?;
    flag_sample_set(&set, &summary, thresholds)
}

fn flag_sample_set(
    set: &SampleSet,
    summary: &StatisticalSummary,
    thresholds: &FlagThresholds,
) -> Result<FlagReport> {
    let mut methods = vec![DetectionTag::StatisticalDeviation];
    let mut candidates = zscore_kernel(set, summary, thresholds.statistical_threshold);
    candidates.extend(iqr_kernel(set, thresholds.iqr_multiplier));

    if thresholds.enable_pattern_analysis {
        if set.len() >= thresholds.pattern.required_points() {
            candidates.extend(pattern::detect_in_sample_set(set, &thresholds.pattern)?);
            methods.push(DetectionTag::PatternChange);
        } else {
            skip_stage(DetectionTag::PatternChange, set.len(), thresholds.pattern.required_points());
        }
    }

    if thresholds.enable_trend_analysis {
        if set.len() >= thresholds.trend.required_points() {
            candidates.extend(trend::detect_in_sample_set(set, &thresholds.trend)?);
            methods.push(DetectionTag::TrendChange);
        } else {
            skip_stage(DetectionTag::TrendChange, set.len(), thresholds.trend.required_points());
        }
    }

    if thresholds.enable_advanced {
        if set.len() >= thresholds.advanced.required_points() {
            candidates.extend(advanced::detect_in_sample_set(set, &thresholds.advanced)?);
            methods.push(DetectionTag::AdvancedMultiAlgorithm);
        } else {
            skip_stage(
                DetectionTag::AdvancedMultiAlgorithm,
                set.len(),
                thresholds.advanced.required_points(),
            );
        }
    }

    let anomalies = merge_anomalies(candidates);
    let summary = AnomalySummary::from_anomalies(&anomalies, set.len(), methods);

    tracing::info!(
        points = set.len(),
        anomalies = summary.total_anomalies,
        high = summary.high_severity,
        rate = summary.anomaly_rate,
        "anomaly flagging complete"
    );

    Ok(FlagReport { anomalies, summary })
}

fn skip_stage(stage: DetectionTag, points: usize, required: usize) {
    tracing::debug!(%stage, points, required, "not enough data, stage skipped");
}
