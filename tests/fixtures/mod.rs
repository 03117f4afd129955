#![allow(dead_code)]

use std::path::PathBuf;

use benchwatch::analysis::AnalysisSettings;
use benchwatch::elements::{Author, BenchmarkPoint, Commit, Polarity, PolarityCatalog, PolarityRule, Run, Timestamp};
use benchwatch::settings::Settings;
use benchwatch::store::StoreSettings;
use benchwatch::validation::ValidationPolicy;
use once_cell::sync::Lazy;

pub const GOOGLECPP: &str = "googlecpp";
pub const BENCHMARKDOTNET: &str = "benchmarkdotnet";

/// 2022-10-03T12:41:53-04:00
pub const FIRST_COMMIT_MILLIS: i64 = 1_664_815_313_000;
const HOUR_MILLIS: i64 = 3_600_000;

pub fn init_tracing() {
    Lazy::force(&benchwatch::tracing::TEST_TRACING);
}

pub fn data_js_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data.js")
}

pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.validation = ValidationPolicy::with_known_tools([GOOGLECPP, BENCHMARKDOTNET]);
    settings.analysis = AnalysisSettings {
        fail_threshold: Some(1.5),
        polarity: PolarityCatalog::new(vec![
            PolarityRule::new(Some(GOOGLECPP), "*", Polarity::LowerIsBetter),
            PolarityRule::new(Some(BENCHMARKDOTNET), "*", Polarity::LowerIsBetter),
        ]),
        ..AnalysisSettings::default()
    };
    settings
}

pub fn file_settings(dir: &std::path::Path) -> Settings {
    let mut settings = settings();
    settings.store = StoreSettings::file(dir);
    settings
}

pub fn commit_id(n: usize) -> String {
    format!("{:040x}", 0xbe7c_0000_u64 + n as u64)
}

/// The `n`th commit of a linear history, one hour apart.
pub fn commit(n: usize) -> Commit {
    Commit::new(commit_id(n), Timestamp::from_millis(FIRST_COMMIT_MILLIS + n as i64 * HOUR_MILLIS))
        .with_author(Author::new("Byron Xu", "byronxu@microsoft.com"))
        .with_message(format!("change #{}", n))
}

pub fn run(tool: &str, n: usize, points: &[(&str, f64, &str)]) -> Run {
    let commit = commit(n);
    let recorded_at = Timestamp::from_millis(commit.timestamp.as_millis() + 20 * 60_000);
    Run::new(
        commit,
        tool,
        recorded_at,
        points.iter().map(|(name, value, unit)| BenchmarkPoint::new(*name, *value, *unit)).collect(),
    )
}

/// One run per value for a single googlecpp benchmark, on consecutive commits starting at `first`.
pub fn history(name: &str, first: usize, values: &[f64]) -> Vec<Run> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| run(GOOGLECPP, first + i, &[(name, *value, "ns/iter")]))
        .collect()
}
