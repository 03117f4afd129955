use benchwatch::elements::{BenchmarkPoint, Commit, Polarity, PolarityCatalog, Run, Timestamp};
use benchwatch::settings::Settings;
use benchwatch::Ingestor;
use criterion::{black_box, criterion_group, Criterion};

const NR_BENCHES: usize = 16;

fn make_run(n: usize) -> Run {
    let commit = Commit::new(format!("{:040x}", n), Timestamp::from_millis(1_664_815_313_000 + n as i64 * 60_000));
    let recorded_at = Timestamp::from_millis(commit.timestamp.as_millis() + 1_000);
    let points = (0..NR_BENCHES)
        .map(|b| BenchmarkPoint::new(format!("bench_text/{}_fts", b), 5_000.0 + ((n * 31 + b) % 97) as f64, "ns/iter"))
        .collect();
    Run::new(commit, "googlecpp", recorded_at, points)
}

fn benchmark_ingest(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().expect("tokio runtime");

    let mut settings = Settings::default();
    settings.analysis.polarity = PolarityCatalog::default().with_default(Polarity::LowerIsBetter);
    let ingestor = rt.block_on(Ingestor::open(&settings)).expect("memory store opens");

    let mut n = 0;
    c.bench_function("ingest_memory_store", |b| {
        b.to_async(&rt).iter(|| {
            n += 1;
            let run = make_run(n);
            let ingestor = &ingestor;
            async move { black_box(ingestor.ingest(run).await.expect("run ingested")) }
        })
    });
}

criterion_group!(ingest, benchmark_ingest);
