//! Configured analysis entry point
//!
//! Binds a validation policy and threshold set loaded from [`EngineConfig`] so
//! repeated report runs share one validated configuration.

use crate::analytics::anomaly::{analyze_sample_set, prepare};
use crate::analytics::flagger::flag_with_policy;
use crate::analytics::{
    DeviationAnalysisOptions, FlagReport, FlagThresholds, MethodResult, StatisticalMethod,
    TimeSeriesPoint, ValidationPolicy,
};
use crate::config::EngineConfig;
use crate::error::Result;

/// 設定済みの異常検知エンジン
#[derive(Debug, Clone)]
pub struct AnomalyEngine {
    policy: ValidationPolicy,
    thresholds: FlagThresholds,
    deviation: DeviationAnalysisOptions,
}

impl AnomalyEngine {
    /// Validates every configured stage up front.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.thresholds.validate()?;
        config.deviation.validate()?;
        Ok(Self {
            policy: config.validation,
            thresholds: config.thresholds.clone(),
            deviation: config.deviation.clone(),
        })
    }

    pub fn thresholds(&self) -> &FlagThresholds {
        &self.thresholds
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// 設定された閾値で異常をフラグ付け
    pub fn flag(&self, data: &[TimeSeriesPoint]) -> Result<FlagReport> {
        flag_with_policy(data, &self.thresholds, &self.policy)
    }

    /// 手法別の比較分析
    pub fn compare(
        &self,
        data: &[TimeSeriesPoint],
        methods: &[StatisticalMethod],
    ) -> Result<Vec<MethodResult>> {
        let (set, summary) = prepare(data, &self.policy, "statistical-deviation")?;
        analyze_sample_set(&set, &summary, methods, &self.deviation)
    }
}
