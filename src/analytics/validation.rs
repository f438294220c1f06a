//! Sample Validation
//!
//! 入力サンプルの検証と正規化

use super::types::{Quality, TimeSeriesPoint};
use serde::{Deserialize, Serialize};

/// 品質コードの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Bad 品質のサンプルを統計計算に含める
    pub include_bad_quality: bool,
    /// Uncertain 品質のサンプルを統計計算に含める
    pub include_uncertain_quality: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            include_bad_quality: false,
            include_uncertain_quality: true,
        }
    }
}

impl ValidationPolicy {
    fn accepts(&self, quality: Quality) -> bool {
        match quality {
            Quality::Good => true,
            Quality::Bad => self.include_bad_quality,
            Quality::Uncertain => self.include_uncertain_quality,
        }
    }
}

/// 検証済みサンプル集合
///
/// Points are finite, accepted by the policy, and sorted ascending by timestamp
/// (stable, so equal timestamps keep their input order).
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    points: Vec<TimeSeriesPoint>,
    rejected_non_finite: usize,
    rejected_quality: usize,
}

impl SampleSet {
    /// 入力を検証・整列
    pub fn from_points(raw: &[TimeSeriesPoint], policy: &ValidationPolicy) -> Self {
        let mut rejected_non_finite = 0;
        let mut rejected_quality = 0;

        let mut points: Vec<TimeSeriesPoint> = raw
            .iter()
            .filter(|p| {
                if !p.value.is_finite() {
                    rejected_non_finite += 1;
                    false
                } else if !policy.accepts(p.quality) {
                    rejected_quality += 1;
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        points.sort_by_key(|p| p.timestamp);

        if rejected_non_finite > 0 || rejected_quality > 0 {
            tracing::debug!(
                accepted = points.len(),
                rejected_non_finite,
                rejected_quality,
                "samples excluded during validation"
            );
        }

        Self {
            points,
            rejected_non_finite,
            rejected_quality,
        }
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn rejected_non_finite(&self) -> usize {
        self.rejected_non_finite
    }

    pub fn rejected_quality(&self) -> usize {
        self.rejected_quality
    }

    /// 最小サンプル数を検査
    pub fn require(&self, detector: &'static str, required: usize) -> crate::Result<()> {
        if self.points.len() < required {
            return Err(crate::Error::insufficient(detector, required, self.points.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn point(offset_secs: i64, value: f64) -> TimeSeriesPoint {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TimeSeriesPoint::new(base + Duration::seconds(offset_secs), value, "TI-100")
    }

    #[test]
    fn test_sorts_chronologically() {
        let raw = vec![point(30, 3.0), point(10, 1.0), point(20, 2.0)];
        let set = SampleSet::from_points(&raw, &ValidationPolicy::default());
        assert_eq!(set.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_excludes_non_finite() {
        let raw = vec![
            point(0, 1.0),
            point(1, f64::NAN),
            point(2, f64::INFINITY),
            point(3, f64::NEG_INFINITY),
            point(4, 2.0),
        ];
        let set = SampleSet::from_points(&raw, &ValidationPolicy::default());
        assert_eq!(set.len(), 2);
        assert_eq!(set.rejected_non_finite(), 3);
        assert!(set.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_quality_policy() {
        let raw = vec![
            point(0, 1.0),
            point(1, 2.0).with_quality(Quality::Bad),
            point(2, 3.0).with_quality(Quality::Uncertain),
        ];

        let set = SampleSet::from_points(&raw, &ValidationPolicy::default());
        assert_eq!(set.values(), vec![1.0, 3.0]);
        assert_eq!(set.rejected_quality(), 1);

        let strict = ValidationPolicy {
            include_bad_quality: false,
            include_uncertain_quality: false,
        };
        assert_eq!(SampleSet::from_points(&raw, &strict).len(), 1);

        let lenient = ValidationPolicy {
            include_bad_quality: true,
            include_uncertain_quality: true,
        };
        assert_eq!(SampleSet::from_points(&raw, &lenient).len(), 3);
    }

    #[test]
    fn test_require_names_minimum() {
        let set = SampleSet::from_points(&[point(0, 1.0)], &ValidationPolicy::default());
        let err = set.require("zscore", 3).unwrap_err();
        assert_eq!(err.required_points(), Some(3));
        assert!(set.require("single", 1).is_ok());
    }
}
