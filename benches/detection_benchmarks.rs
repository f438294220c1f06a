use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use historian_anomaly::{
    detect_anomalies, detect_pattern_changes, flag_anomalies,
    perform_statistical_deviation_analysis, FlagThresholds, PatternOptions, StatisticalMethod,
    TimeSeriesPoint,
};

fn generate_series(len: usize) -> Vec<TimeSeriesPoint> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..len)
        .map(|i| {
            let mut value = 50.0 + (i as f64 * 0.1).sin() * 2.0;
            if i % 97 == 0 {
                value += 25.0;
            }
            if i > len / 2 {
                value += 8.0;
            }
            TimeSeriesPoint::new(base + Duration::seconds(i as i64), value, "FIC-101.PV")
        })
        .collect()
}

fn benchmark_zscore(c: &mut Criterion) {
    let data = generate_series(10_000);

    c.bench_function("zscore_10k", |b| {
        b.iter(|| {
            let _ = detect_anomalies(black_box(&data), black_box(3.0)).unwrap();
        })
    });
}

fn benchmark_flag_anomalies(c: &mut Criterion) {
    let mut group = c.benchmark_group("flag_anomalies");
    let thresholds = FlagThresholds {
        enable_advanced: true,
        ..FlagThresholds::default()
    };

    for len in [100, 1_000, 10_000] {
        let data = generate_series(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &data, |b, data| {
            b.iter(|| {
                let _ = flag_anomalies(black_box(data), black_box(&thresholds)).unwrap();
            })
        });
    }

    group.finish();
}

fn benchmark_pattern_changes(c: &mut Criterion) {
    let data = generate_series(10_000);
    let options = PatternOptions::default();

    c.bench_function("pattern_changes_10k", |b| {
        b.iter(|| {
            let _ = detect_pattern_changes(black_box(&data), black_box(&options)).unwrap();
        })
    });
}

fn benchmark_method_comparison(c: &mut Criterion) {
    let data = generate_series(1_000);

    c.bench_function("deviation_analysis_all_methods_1k", |b| {
        b.iter(|| {
            let _ = perform_statistical_deviation_analysis(
                black_box(&data),
                black_box(&StatisticalMethod::ALL),
            )
            .unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_zscore,
    benchmark_flag_anomalies,
    benchmark_pattern_changes,
    benchmark_method_comparison
);
criterion_main!(benches);
