mod fixtures;

use anyhow::Result;
use benchwatch::elements::{SeriesWindow, Timestamp};
use benchwatch::ingest::ImportSummary;
use benchwatch::legacy::{LegacyDocument, DATA_JS_PREFIX, DEFAULT_GROUP};
use benchwatch::query::ExportSettings;
use benchwatch::Ingestor;
use fixtures::*;
use pretty_assertions::assert_eq;

const LEARN: &str = "benchmark_learn_simple/8_features";

#[tokio::test]
async fn test_import_data_js_history() -> Result<()> {
    init_tracing();
    let ingestor = Ingestor::open(&settings()).await?;
    let document = LegacyDocument::load(data_js_path()).await?;
    assert_eq!(document.nr_entries(), 6);

    let summary = ingestor.import_legacy(document.clone()).await?;
    assert_eq!(summary, ImportSummary { ingested: 6, ..ImportSummary::default() });

    let query = ingestor.query();
    let series = query.series(GOOGLECPP, LEARN, &SeriesWindow::all());
    assert_eq!(series.len(), 4);
    assert_eq!(series.points[0].commit_id, "ea278c49f059b548725b653e82df1920b3180ffd");
    assert_eq!(series.points[0].commit_timestamp, Timestamp::from_millis(FIRST_COMMIT_MILLIS));
    assert_eq!(series.points[0].recorded_at, Timestamp::from_millis(1_664_816_672_769));
    assert!(series.points.iter().all(|p| p.unit == "ns/iter"));
    assert_eq!(query.known_benchmarks(BENCHMARKDOTNET).len(), 3);
    assert!(query.alerts(None).is_empty());

    let again = ingestor.import_legacy(document).await?;
    assert_eq!(again, ImportSummary { duplicates: 6, ..ImportSummary::default() });
    Ok(())
}

#[tokio::test]
async fn test_export_reimports_to_same_series() -> Result<()> {
    init_tracing();
    let source = Ingestor::open(&settings()).await?;
    source.import_legacy(LegacyDocument::load(data_js_path()).await?).await?;

    let export = ExportSettings {
        repo_url: "https://github.com/VowpalWabbit/vowpal_wabbit".to_string(),
        ..ExportSettings::default()
    };
    let document = source.query().export_legacy(&export);
    assert_eq!(document.nr_entries(), 6);
    assert_eq!(document.last_update, Timestamp::from_millis(1_664_910_014_619));

    let text = document.to_data_js()?;
    assert!(text.starts_with(DATA_JS_PREFIX));

    let target = Ingestor::open(&settings()).await?;
    let summary = target.import_legacy(LegacyDocument::parse(&text)?).await?;
    assert_eq!(summary.ingested, 6);

    for tool in [GOOGLECPP, BENCHMARKDOTNET] {
        for name in source.query().known_benchmarks(tool) {
            assert_eq!(
                target.query().series(tool, &name, &SeriesWindow::all()),
                source.query().series(tool, &name, &SeriesWindow::all()),
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_export_keeps_most_recent_entries() -> Result<()> {
    init_tracing();
    let ingestor = Ingestor::open(&settings()).await?;
    ingestor.import_legacy(LegacyDocument::load(data_js_path()).await?).await?;

    let export = ExportSettings { group: "vw".to_string(), max_items: Some(2), ..ExportSettings::default() };
    let document = ingestor.query().export_legacy(&export);
    let entries = &document.entries["vw"];
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.tool == GOOGLECPP));
    assert_eq!(entries[0].commit.id, "a9d2bd04c0d25d4de4af2599b9551ec547902f9b");
    assert_eq!(entries[1].commit.id, "befbd6674f31adceb15299f3f581f86ec6eabea2");
    assert_eq!(entries[1].commit.timestamp, "2022-10-04T18:39:45Z");
    assert_eq!(document.last_update, Timestamp::from_millis(1_664_910_014_619));
    Ok(())
}

#[tokio::test]
async fn test_unreadable_entry_is_skipped() -> Result<()> {
    init_tracing();
    let text = tokio::fs::read_to_string(data_js_path()).await?;
    let text = text.replacen("\"timestamp\": \"2022-10-04T14:39:45-04:00\"", "\"timestamp\": \"garbage\"", 1);
    let document = LegacyDocument::parse(&text)?;
    assert_eq!(document.nr_entries(), 6);

    let ingestor = Ingestor::open(&settings()).await?;
    let summary = ingestor.import_legacy(document).await?;
    assert_eq!(summary, ImportSummary { ingested: 5, rejected: 1, ..ImportSummary::default() });

    let query = ingestor.query();
    assert_eq!(
        query.known_tools(),
        maplit::btreeset! { BENCHMARKDOTNET.to_string(), GOOGLECPP.to_string() }
    );
    let series = query.series(GOOGLECPP, LEARN, &SeriesWindow::all());
    assert_eq!(series.len(), 3);
    assert!(series.points.iter().all(|p| p.commit_id != "befbd6674f31adceb15299f3f581f86ec6eabea2"));
    Ok(())
}

#[tokio::test]
async fn test_import_follows_file_order_across_groups() -> Result<()> {
    init_tracing();
    let entry = |id: &str, date: i64| {
        format!(
            r#"{{ "commit": {{ "id": "{}", "timestamp": "2022-10-03T12:41:53-04:00" }}, "date": {}, "tool": "googlecpp",
                 "benches": [ {{ "name": "{}", "value": 83.8, "unit": "ns/iter" }} ] }}"#,
            id, date, LEARN
        )
    };
    let text = format!(
        r#"window.BENCHMARK_DATA = {{ "lastUpdate": 1664816672770, "entries": {{ "zeta": [ {} ], "alpha": [ {} ] }} }}"#,
        entry("aaaa", 1_664_816_672_769),
        entry("bbbb", 1_664_816_672_770),
    );

    let document = LegacyDocument::parse(&text)?;
    assert_eq!(document.entries.keys().map(String::as_str).collect::<Vec<_>>(), vec!["zeta", "alpha"]);

    let ingestor = Ingestor::open(&settings()).await?;
    let summary = ingestor.import_legacy(document).await?;
    assert_eq!(summary.ingested, 2);

    let runs = ingestor.query().export_legacy(&ExportSettings::default());
    let ids: Vec<&str> = runs.entries[DEFAULT_GROUP].iter().map(|e| e.commit.id.as_str()).collect();
    assert_eq!(ids, vec!["aaaa", "bbbb"]);

    // same commit time, so the series falls back to ingestion order
    let series = ingestor.query().series(GOOGLECPP, LEARN, &SeriesWindow::all());
    let sequences: Vec<(String, u64)> = series.points.iter().map(|p| (p.commit_id.clone(), p.sequence)).collect();
    assert_eq!(sequences, vec![("aaaa".to_string(), 0), ("bbbb".to_string(), 1)]);
    Ok(())
}
