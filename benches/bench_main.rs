use criterion::criterion_main;

mod benchmarks;

criterion_main! {
    benchmarks::analysis::analysis,
    benchmarks::ingest::ingest,
}
