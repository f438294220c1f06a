//! IQR Fencing
//!
//! 四分位範囲（IQR）による外れ値検知

use crate::analytics::is_negligible_spread;
use crate::analytics::statistics::{quantile, sorted_copy};
use crate::analytics::types::{AnomalyRecord, Severity, TimeSeriesPoint};

/// Tukey フェンス
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    /// 値の配列からフェンスを計算
    pub fn from_values(values: &[f64], multiplier: f64) -> Option<Self> {
        let sorted = sorted_copy(values);
        let q1 = quantile(&sorted, 0.25)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }
}

/// フェンス外の点を検出
///
/// `deviation` is the distance beyond the nearer fence in units of IQR. An
/// IQR of zero yields no anomalies.
pub(crate) fn detect(points: &[TimeSeriesPoint], multiplier: f64) -> Vec<AnomalyRecord> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let Some(fences) = IqrFences::from_values(&values, multiplier) else {
        return Vec::new();
    };

    if is_negligible_spread(fences.iqr, fences.q1.abs().max(fences.q3.abs())) {
        tracing::debug!("iqr: interquartile range is zero, skipping");
        return Vec::new();
    }

    points
        .iter()
        .filter_map(|p| {
            let (fence, distance) = if p.value < fences.lower {
                (fences.lower, fences.lower - p.value)
            } else if p.value > fences.upper {
                (fences.upper, p.value - fences.upper)
            } else {
                return None;
            };

            let deviation = distance / fences.iqr;
            if deviation <= 0.0 || !deviation.is_finite() {
                return None;
            }

            Some(AnomalyRecord {
                timestamp: p.timestamp,
                value: p.value,
                expected_value: fence,
                deviation,
                severity: Severity::from_ratio((multiplier + deviation) / multiplier),
                description: format!(
                    "Value {:.3} outside IQR fences [{:.3}, {:.3}] by {:.2}×IQR",
                    p.value, fences.lower, fences.upper, deviation
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::series;

    #[test]
    fn test_fences() {
        let values: Vec<f64> = (1..=9).map(|i| i as f64).collect();
        let fences = IqrFences::from_values(&values, 1.5).unwrap();
        assert_eq!(fences.q1, 3.0);
        assert_eq!(fences.q3, 7.0);
        assert_eq!(fences.lower, -3.0);
        assert_eq!(fences.upper, 13.0);
    }

    #[test]
    fn test_detect_iqr() {
        let mut values: Vec<f64> = (0..20).map(|i| 50.0 + i as f64).collect();
        values.push(200.0);
        values.push(-100.0);
        let anomalies = detect(&series(&values), 1.5);

        assert_eq!(anomalies.len(), 2);
        let high = anomalies.iter().find(|a| a.value == 200.0).unwrap();
        let fences = IqrFences::from_values(&values, 1.5).unwrap();
        assert_eq!(high.expected_value, fences.upper);
        assert!((high.deviation - (200.0 - fences.upper) / fences.iqr).abs() < 1e-9);
        assert!(anomalies.iter().any(|a| a.value == -100.0));
    }

    #[test]
    fn test_zero_iqr() {
        let mut values = vec![42.0; 29];
        values.push(100.0);
        assert!(detect(&series(&values), 1.5).is_empty());

        assert!(detect(&series(&[98.6; 30]), 0.5).is_empty());
    }
}
