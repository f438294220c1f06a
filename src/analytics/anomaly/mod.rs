//! Anomaly Detection Module
//!
//! 単一手法の外れ値検知器

mod dixon;
mod grubbs;
mod iqr;
mod modified_zscore;
mod zscore;

pub use iqr::IqrFences;

use super::types::{
    AnomalyRecord, MethodResult, StatisticalMethod, StatisticalSummary, TimeSeriesPoint,
};
use super::validation::{SampleSet, ValidationPolicy};
use super::{ensure_positive, ensure_probability};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Minimum valid sample count for any single-point statistical test
pub const MIN_STATISTICAL_POINTS: usize = 3;

/// `perform_statistical_deviation_analysis` の手法別設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviationAnalysisOptions {
    /// Z-スコア閾値（既定 3.0）
    pub zscore_threshold: f64,
    /// 修正Z-スコア閾値（既定 3.5, Iglewicz & Hoaglin）
    pub modified_zscore_threshold: f64,
    /// グラブス検定の有意水準（既定 0.05）
    pub grubbs_alpha: f64,
    /// 臨界値より厳しい下限（任意）
    pub grubbs_threshold: Option<f64>,
}

impl Default for DeviationAnalysisOptions {
    fn default() -> Self {
        Self {
            zscore_threshold: 3.0,
            modified_zscore_threshold: 3.5,
            grubbs_alpha: 0.05,
            grubbs_threshold: None,
        }
    }
}

impl DeviationAnalysisOptions {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("zscore_threshold", self.zscore_threshold)?;
        ensure_positive("modified_zscore_threshold", self.modified_zscore_threshold)?;
        ensure_probability("grubbs_alpha", self.grubbs_alpha)?;
        if let Some(threshold) = self.grubbs_threshold {
            ensure_positive("grubbs_threshold", threshold)?;
        }
        Ok(())
    }
}

type MethodKernel =
    fn(&[TimeSeriesPoint], &StatisticalSummary, &DeviationAnalysisOptions) -> Vec<AnomalyRecord>;

fn run_zscore(
    points: &[TimeSeriesPoint],
    summary: &StatisticalSummary,
    options: &DeviationAnalysisOptions,
) -> Vec<AnomalyRecord> {
    zscore::detect(points, summary, options.zscore_threshold)
}

fn run_modified_zscore(
    points: &[TimeSeriesPoint],
    summary: &StatisticalSummary,
    options: &DeviationAnalysisOptions,
) -> Vec<AnomalyRecord> {
    modified_zscore::detect(points, summary, options.modified_zscore_threshold)
}

fn run_grubbs(
    points: &[TimeSeriesPoint],
    summary: &StatisticalSummary,
    options: &DeviationAnalysisOptions,
) -> Vec<AnomalyRecord> {
    grubbs::detect(points, summary, options.grubbs_alpha, options.grubbs_threshold)
}

fn run_dixon(
    points: &[TimeSeriesPoint],
    _summary: &StatisticalSummary,
    _options: &DeviationAnalysisOptions,
) -> Vec<AnomalyRecord> {
    dixon::detect(points)
}

impl StatisticalMethod {
    fn kernel(self) -> MethodKernel {
        match self {
            StatisticalMethod::ZScore => run_zscore,
            StatisticalMethod::ModifiedZScore => run_modified_zscore,
            StatisticalMethod::Grubbs => run_grubbs,
            StatisticalMethod::Dixon => run_dixon,
        }
    }
}

/// 検証済みサンプルと統計量を準備
pub(crate) fn prepare(
    data: &[TimeSeriesPoint],
    policy: &ValidationPolicy,
    detector: &'static str,
) -> Result<(SampleSet, StatisticalSummary)> {
    let set = SampleSet::from_points(data, policy);
    set.require(detector, MIN_STATISTICAL_POINTS)?;
    let summary = StatisticalSummary::from_values(&set.values())
        .ok_or_else(|| Error::insufficient(detector, MIN_STATISTICAL_POINTS, 0))?;
    Ok((set, summary))
}

pub(crate) fn zscore_kernel(
    set: &SampleSet,
    summary: &StatisticalSummary,
    threshold: f64,
) -> Vec<AnomalyRecord> {
    zscore::detect(set.points(), summary, threshold)
}

pub(crate) fn iqr_kernel(set: &SampleSet, multiplier: f64) -> Vec<AnomalyRecord> {
    iqr::detect(set.points(), multiplier)
}

/// Z-スコア法による異常検知
///
/// Fails with [`Error::InsufficientData`] when fewer than three finite points
/// remain after validation.
pub fn detect_anomalies(data: &[TimeSeriesPoint], threshold: f64) -> Result<Vec<AnomalyRecord>> {
    ensure_positive("threshold", threshold)?;
    let (set, summary) = prepare(data, &ValidationPolicy::default(), "zscore")?;
    let anomalies = zscore::detect(set.points(), &summary, threshold);
    tracing::debug!(points = set.len(), anomalies = anomalies.len(), threshold, "zscore detection");
    Ok(anomalies)
}

/// 修正Z-スコア法による異常検知
pub fn detect_modified_zscore(
    data: &[TimeSeriesPoint],
    threshold: f64,
) -> Result<Vec<AnomalyRecord>> {
    ensure_positive("threshold", threshold)?;
    let (set, summary) = prepare(data, &ValidationPolicy::default(), "modified-zscore")?;
    Ok(modified_zscore::detect(set.points(), &summary, threshold))
}

/// グラブス検定
pub fn detect_grubbs(
    data: &[TimeSeriesPoint],
    alpha: f64,
    threshold: Option<f64>,
) -> Result<Vec<AnomalyRecord>> {
    ensure_probability("alpha", alpha)?;
    if let Some(threshold) = threshold {
        ensure_positive("threshold", threshold)?;
    }
    let (set, summary) = prepare(data, &ValidationPolicy::default(), "grubbs")?;
    Ok(grubbs::detect(set.points(), &summary, alpha, threshold))
}

/// ディクソンQ検定（n > 30 では常に空）
pub fn detect_dixon(data: &[TimeSeriesPoint]) -> Result<Vec<AnomalyRecord>> {
    let (set, _) = prepare(data, &ValidationPolicy::default(), "dixon")?;
    Ok(dixon::detect(set.points()))
}

/// IQR フェンスによる異常検知
pub fn detect_iqr(data: &[TimeSeriesPoint], multiplier: f64) -> Result<Vec<AnomalyRecord>> {
    ensure_positive("multiplier", multiplier)?;
    let (set, _) = prepare(data, &ValidationPolicy::default(), "iqr")?;
    Ok(iqr::detect(set.points(), multiplier))
}

/// 複数手法を個別に実行（既定設定）
pub fn perform_statistical_deviation_analysis(
    data: &[TimeSeriesPoint],
    methods: &[StatisticalMethod],
) -> Result<Vec<MethodResult>> {
    perform_statistical_deviation_analysis_with_options(
        data,
        methods,
        &DeviationAnalysisOptions::default(),
    )
}

/// 複数手法を個別に実行
///
/// Results are returned one per requested method, in request order, without
/// merging.
pub fn perform_statistical_deviation_analysis_with_options(
    data: &[TimeSeriesPoint],
    methods: &[StatisticalMethod],
    options: &DeviationAnalysisOptions,
) -> Result<Vec<MethodResult>> {
    options.validate()?;
    ensure_methods(methods)?;
    let (set, summary) = prepare(data, &ValidationPolicy::default(), "statistical-deviation")?;
    analyze_sample_set(&set, &summary, methods, options)
}

pub(crate) fn analyze_sample_set(
    set: &SampleSet,
    summary: &StatisticalSummary,
    methods: &[StatisticalMethod],
    options: &DeviationAnalysisOptions,
) -> Result<Vec<MethodResult>> {
    ensure_methods(methods)?;

    Ok(methods
        .iter()
        .map(|&method| {
            let anomalies = (method.kernel())(set.points(), summary, options);
            tracing::debug!(%method, anomalies = anomalies.len(), "method analysis complete");
            MethodResult {
                method,
                anomalies,
                statistics: *summary,
            }
        })
        .collect())
}

fn ensure_methods(methods: &[StatisticalMethod]) -> Result<()> {
    if methods.is_empty() {
        return Err(Error::invalid("at least one detection method is required"));
    }
    Ok(())
}

/// 手法名の配列を解析
pub fn parse_methods<S: AsRef<str>>(names: &[S]) -> Result<Vec<StatisticalMethod>> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}
