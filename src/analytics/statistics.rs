//! Statistical Summary
//!
//! 記述統計量と回帰の計算

use super::types::StatisticalSummary;

impl StatisticalSummary {
    /// 値の配列から統計量を計算（空の場合は None）
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let sorted = sorted_copy(values);
        if let (Some(&lowest), Some(&highest)) = (sorted.first(), sorted.last()) {
            // 定数列は丸め誤差なしで返す
            if lowest == highest {
                return Some(Self {
                    mean: lowest,
                    median: lowest,
                    standard_deviation: 0.0,
                    mad: 0.0,
                });
            }
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let median = median_of_sorted(&sorted);

        let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
        let mad = median_of_sorted(&sorted_copy(&deviations));

        Some(Self {
            mean,
            median,
            standard_deviation: variance.max(0.0).sqrt(),
            mad,
        })
    }

    /// Sample (n - 1) standard deviation derived from the population value.
    pub fn sample_standard_deviation(&self, n: usize) -> f64 {
        if n < 2 {
            return 0.0;
        }
        self.standard_deviation * (n as f64 / (n as f64 - 1.0)).sqrt()
    }
}

/// 昇順にソートしたコピー
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Quantile of an ascending slice, interpolating linearly between closest
/// ranks (Hyndman-Fan type 7). `p` is clamped to [0, 1].
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let p = p.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    let fraction = h - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// 最小二乗法による直線
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// x 位置での予測値
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// 線形回帰（x はインデックス）
pub fn linear_regression(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, y) in values.iter().enumerate() {
        let x_diff = i as f64 - x_mean;
        numerator += x_diff * (y - y_mean);
        denominator += x_diff * x_diff;
    }

    if denominator.abs() < f64::EPSILON {
        return None;
    }

    let slope = numerator / denominator;
    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}
