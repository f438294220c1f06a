//! Analytics Types
//!
//! 異常検知エンジンの型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ヒストリアンの品質コード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// 信頼できる値
    #[default]
    Good,
    /// 信頼できない値
    Bad,
    /// 不確定
    Uncertain,
}

/// ヒストリアンから供給される時系列サンプル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// タイムスタンプ
    pub timestamp: DateTime<Utc>,
    /// 値
    pub value: f64,
    /// 品質コード
    #[serde(default)]
    pub quality: Quality,
    /// タグ名
    #[serde(default)]
    pub tag_name: String,
}

impl TimeSeriesPoint {
    /// 新しいサンプルを作成（品質 Good）
    pub fn new(timestamp: DateTime<Utc>, value: f64, tag_name: impl Into<String>) -> Self {
        Self {
            timestamp,
            value,
            quality: Quality::Good,
            tag_name: tag_name.into(),
        }
    }

    /// 品質コードを設定
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

/// 異常の重大度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Maps how far a deviation exceeds its cutoff onto a severity.
    ///
    /// `ratio` is `deviation / cutoff`; anything below 2× is low, below 3× is
    /// medium, and the rest is high. Non-decreasing in `ratio`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 2.0 {
            Severity::Low
        } else if ratio < 3.0 {
            Severity::Medium
        } else {
            Severity::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 検出された異常
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    /// タイムスタンプ
    pub timestamp: DateTime<Utc>,
    /// 観測値
    pub value: f64,
    /// 期待値
    pub expected_value: f64,
    /// 偏差（常に正）
    pub deviation: f64,
    /// 重大度
    pub severity: Severity,
    /// 説明
    pub description: String,
}

/// 記述統計量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticalSummary {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub standard_deviation: f64,
    /// Unscaled median absolute deviation
    pub mad: f64,
}

/// 統計的偏差分析の手法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatisticalMethod {
    #[serde(rename = "zscore")]
    ZScore,
    #[serde(rename = "modified-zscore")]
    ModifiedZScore,
    Grubbs,
    Dixon,
}

impl StatisticalMethod {
    pub const ALL: [StatisticalMethod; 4] = [
        StatisticalMethod::ZScore,
        StatisticalMethod::ModifiedZScore,
        StatisticalMethod::Grubbs,
        StatisticalMethod::Dixon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticalMethod::ZScore => "zscore",
            StatisticalMethod::ModifiedZScore => "modified-zscore",
            StatisticalMethod::Grubbs => "grubbs",
            StatisticalMethod::Dixon => "dixon",
        }
    }
}

impl fmt::Display for StatisticalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatisticalMethod {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zscore" | "z-score" => Ok(StatisticalMethod::ZScore),
            "modified-zscore" | "modified_zscore" | "modified-z-score" => {
                Ok(StatisticalMethod::ModifiedZScore)
            }
            "grubbs" => Ok(StatisticalMethod::Grubbs),
            "dixon" => Ok(StatisticalMethod::Dixon),
            other => Err(crate::error::Error::invalid(format!(
                "unknown detection method '{}', expected one of: zscore, modified-zscore, grubbs, dixon",
                other
            ))),
        }
    }
}

/// 手法ごとの分析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResult {
    pub method: StatisticalMethod,
    pub anomalies: Vec<AnomalyRecord>,
    pub statistics: StatisticalSummary,
}

/// 集約レポートに記録される検出段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionTag {
    StatisticalDeviation,
    AdvancedMultiAlgorithm,
    PatternChange,
    TrendChange,
}

impl DetectionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionTag::StatisticalDeviation => "statistical-deviation",
            DetectionTag::AdvancedMultiAlgorithm => "advanced-multi-algorithm",
            DetectionTag::PatternChange => "pattern-change",
            DetectionTag::TrendChange => "trend-change",
        }
    }
}

impl fmt::Display for DetectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 異常サマリー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalySummary {
    pub total_anomalies: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    /// 異常率（0-100%）
    pub anomaly_rate: f64,
    pub detection_methods: Vec<DetectionTag>,
}

impl AnomalySummary {
    /// 異常リストとサンプル数からサマリーを作成
    pub fn from_anomalies(
        anomalies: &[AnomalyRecord],
        sample_count: usize,
        detection_methods: Vec<DetectionTag>,
    ) -> Self {
        let count = |severity: Severity| anomalies.iter().filter(|a| a.severity == severity).count();

        let anomaly_rate = if sample_count == 0 {
            0.0
        } else {
            (anomalies.len() as f64 / sample_count as f64 * 100.0).clamp(0.0, 100.0)
        };

        Self {
            total_anomalies: anomalies.len(),
            high_severity: count(Severity::High),
            medium_severity: count(Severity::Medium),
            low_severity: count(Severity::Low),
            anomaly_rate,
            detection_methods,
        }
    }
}

/// `flag_anomalies` の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagReport {
    pub anomalies: Vec<AnomalyRecord>,
    pub summary: AnomalySummary,
}
