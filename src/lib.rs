//! # historian-anomaly
//!
//! Statistical anomaly, pattern-change and trend-change detection for
//! historian time-series samples.
//!
//! The engine is a set of pure functions over `&[TimeSeriesPoint]`: it never
//! fetches, caches or persists anything, and every call is independent.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use historian_anomaly::{flag_anomalies, FlagThresholds, TimeSeriesPoint};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let data: Vec<TimeSeriesPoint> = (0..50)
//!     .map(|i| {
//!         let value = if i == 25 { 400.0 } else { 100.0 + (i % 5) as f64 };
//!         TimeSeriesPoint::new(start + Duration::minutes(i), value, "FIC-101.PV")
//!     })
//!     .collect();
//!
//! let report = flag_anomalies(&data, &FlagThresholds::default()).unwrap();
//! assert!(report.anomalies.iter().any(|a| a.value == 400.0));
//! ```

pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use analytics::{
    detect_advanced_anomalies, detect_anomalies, detect_dixon, detect_grubbs, detect_iqr,
    detect_modified_zscore, detect_pattern_changes, detect_significant_trend_changes,
    flag_anomalies, perform_statistical_deviation_analysis,
    perform_statistical_deviation_analysis_with_options, AdvancedOptions, AnomalyRecord,
    AnomalySummary, DetectionTag, DeviationAnalysisOptions, FlagReport, FlagThresholds,
    MethodResult, PatternOptions, Quality, Severity, StatisticalMethod, StatisticalSummary,
    TimeSeriesPoint, TrendOptions, ValidationPolicy,
};
pub use config::EngineConfig;
pub use engine::AnomalyEngine;
pub use error::{Error, Result};
