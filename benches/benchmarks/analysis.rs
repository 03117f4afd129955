use benchwatch::analysis::{AnalysisSettings, RegressionAnalyzer};
use benchwatch::elements::{Polarity, PolarityCatalog, SeriesKey, SeriesPoint, Timestamp};
use criterion::{black_box, criterion_group, BenchmarkId, Criterion};

fn make_point(i: u64, value: f64) -> SeriesPoint {
    SeriesPoint {
        commit_id: format!("{:040x}", i),
        commit_timestamp: Timestamp::from_millis(1_664_815_313_000 + i as i64 * 3_600_000),
        recorded_at: Timestamp::from_millis(1_664_816_672_769 + i as i64 * 3_600_000),
        sequence: i,
        value,
        unit: "ns/iter".to_string(),
    }
}

fn benchmark_assess(c: &mut Criterion) {
    let key = SeriesKey::new("googlecpp", "benchmark_learn_simple/8_features");
    let mut group = c.benchmark_group("assess");

    for window in [5_usize, 20, 100] {
        let settings = AnalysisSettings {
            window,
            polarity: PolarityCatalog::default().with_default(Polarity::LowerIsBetter),
            ..AnalysisSettings::default()
        };
        let analyzer = RegressionAnalyzer::new(settings).expect("valid analysis settings");
        let prior: Vec<SeriesPoint> = (0..window as u64).map(|i| make_point(i, 80.0 + (i % 7) as f64)).collect();
        let candidate = make_point(window as u64, 97.5);

        group.bench_with_input(BenchmarkId::from_parameter(window), &prior, |b, prior| {
            b.iter(|| black_box(analyzer.assess(&key, &candidate, prior, false)))
        });
    }

    group.finish();
}

criterion_group!(analysis, benchmark_assess);
