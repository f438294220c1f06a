//! Trend Change Detection
//!
//! 隣接ウィンドウ間の傾き・ボラティリティ変化を検知

use super::statistics::linear_regression;
use super::types::{AnomalyRecord, Severity, StatisticalSummary, TimeSeriesPoint};
use super::validation::{SampleSet, ValidationPolicy};
use super::{ensure_positive, is_negligible_spread, tumbling_windows};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Windows needed: before, after, and one more to confirm the regime
pub const MIN_TREND_WINDOWS: usize = 3;

/// トレンド変化検知の設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendOptions {
    /// ウィンドウサイズ（既定 10）
    pub window_size: usize,
    /// 傾きの差の閾値（値/サンプル、既定 1.0）
    pub trend_threshold: f64,
    /// 標準偏差比の閾値（既定 3.0）
    pub volatility_threshold: f64,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            window_size: 10,
            trend_threshold: 1.0,
            volatility_threshold: 3.0,
        }
    }
}

impl TrendOptions {
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 3 {
            return Err(Error::invalid(format!(
                "trend window_size must be at least 3, got {}",
                self.window_size
            )));
        }
        ensure_positive("trend_threshold", self.trend_threshold)?;
        ensure_positive("volatility_threshold", self.volatility_threshold)?;
        Ok(())
    }

    /// 必要なサンプル数
    pub fn required_points(&self) -> usize {
        self.window_size * MIN_TREND_WINDOWS
    }
}

/// トレンド変化を検知
pub fn detect_significant_trend_changes(
    data: &[TimeSeriesPoint],
    options: &TrendOptions,
) -> Result<Vec<AnomalyRecord>> {
    options.validate()?;
    let set = SampleSet::from_points(data, &ValidationPolicy::default());
    detect_in_sample_set(&set, options)
}

/// ウィンドウ単位の特徴量
struct WindowTrend {
    slope: f64,
    intercept: f64,
    mean: f64,
    std_dev: f64,
}

impl WindowTrend {
    fn from_values(values: &[f64]) -> Option<Self> {
        let fit = linear_regression(values)?;
        let summary = StatisticalSummary::from_values(values)?;
        Some(Self {
            slope: fit.slope,
            intercept: fit.intercept,
            mean: summary.mean,
            std_dev: summary.standard_deviation,
        })
    }
}

/// 標準偏差比（大 / 小）
///
/// None when the quieter window has no dispersion relative to its own level.
fn volatility_ratio(a: &WindowTrend, b: &WindowTrend) -> Option<f64> {
    let (quiet, loud) = if a.std_dev <= b.std_dev { (a, b) } else { (b, a) };
    if is_negligible_spread(quiet.std_dev, quiet.mean) {
        return None;
    }
    Some(loud.std_dev / quiet.std_dev)
}

pub(crate) fn detect_in_sample_set(
    set: &SampleSet,
    options: &TrendOptions,
) -> Result<Vec<AnomalyRecord>> {
    set.require("trend-change", options.required_points())?;

    let points = set.points();
    let values = set.values();
    let window = options.window_size;
    let trends: Vec<(usize, WindowTrend)> = tumbling_windows(values.len(), window)
        .filter_map(|range| WindowTrend::from_values(&values[range.clone()]).map(|t| (range.start, t)))
        .collect();

    let mut changes = Vec::new();
    for pair in trends.windows(2) {
        let (_, before) = &pair[0];
        let (boundary_index, after) = &pair[1];

        let slope_diff = (after.slope - before.slope).abs();
        let slope_ratio = slope_diff / options.trend_threshold;

        // 片方が一定値の場合は比率を定義できないため判定しない
        let ratio = volatility_ratio(before, after);
        let volatility_score = ratio.map_or(0.0, |r| r / options.volatility_threshold);

        let trend_changed = slope_diff > options.trend_threshold;
        let volatility_changed = ratio.is_some_and(|r| r > options.volatility_threshold);
        if !trend_changed && !volatility_changed {
            continue;
        }

        let deviation = slope_ratio.max(volatility_score);
        if !deviation.is_finite() || deviation <= 0.0 {
            continue;
        }

        let boundary = &points[*boundary_index];
        let projected = before.intercept + before.slope * window as f64;
        let reason = match (trend_changed, volatility_changed) {
            (true, true) => "slope and volatility",
            (true, false) => "slope",
            _ => "volatility",
        };

        changes.push(AnomalyRecord {
            timestamp: boundary.timestamp,
            value: boundary.value,
            expected_value: projected,
            deviation,
            severity: Severity::from_ratio(deviation),
            description: format!(
                "Trend change ({}): slope {:.4} → {:.4}, σ {:.3} → {:.3}",
                reason, before.slope, after.slope, before.std_dev, after.std_dev
            ),
        });
    }

    tracing::debug!(
        points = points.len(),
        windows = trends.len(),
        changes = changes.len(),
        "trend change detection"
    );

    Ok(changes)
}
