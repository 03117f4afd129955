use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use benchwatch::elements::{Run, SeriesWindow, Timestamp};
use benchwatch::legacy::LegacyDocument;
use benchwatch::settings::{self, Settings};
use benchwatch::tracing::{get_subscriber, init_subscriber};
use benchwatch::Ingestor;
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Benchmark history store and regression detector.
#[derive(Debug, Parser)]
#[command(name = "benchwatch", version, about)]
struct CliOptions {
    /// Configuration file layered over `resources/application.yaml`.
    #[arg(short, long, global = true, env = "BENCHWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest one run document (JSON) and report any regressions it raised.
    Ingest { run: PathBuf },

    /// Import the history held in a github-action-benchmark `data.js` file.
    Import { data_js: PathBuf },

    /// Show the series of one benchmark.
    Series {
        #[arg(long)]
        tool: String,
        #[arg(long)]
        name: String,
        /// Keep only the trailing N points.
        #[arg(long)]
        last: Option<usize>,
        /// Earliest commit time, as RFC 3339 or epoch millis.
        #[arg(long)]
        from: Option<Timestamp>,
        /// Latest commit time, as RFC 3339 or epoch millis.
        #[arg(long)]
        to: Option<Timestamp>,
    },

    /// List the benchmarks recorded for a tool.
    Benchmarks {
        #[arg(long)]
        tool: String,
    },

    /// List the tools that have recorded runs.
    Tools,

    /// List regression alerts.
    Alerts {
        #[arg(long)]
        since: Option<Timestamp>,
    },

    /// Write the stored history as a github-action-benchmark `data.js` file.
    Export {
        out: PathBuf,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        max_items: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let subscriber = get_subscriber("benchwatch", "warn", std::io::stderr);
    init_subscriber(subscriber);

    let options = CliOptions::parse();
    tracing::info!(?options, "CLI parsed");

    let settings = settings::load_settings(options.config.as_deref()).context("failed to load settings")?;
    let ingestor = Ingestor::open(&settings).await.context("failed to open benchmark store")?;

    let outcome = execute(options.command, &ingestor, &settings).await;
    ingestor.close().await?;
    outcome
}

async fn execute(command: Command, ingestor: &Ingestor, settings: &Settings) -> anyhow::Result<ExitCode> {
    let query = ingestor.query();

    match command {
        Command::Ingest { run } => {
            let text = tokio::fs::read_to_string(&run)
                .await
                .with_context(|| format!("failed to read run document {}", run.display()))?;
            let candidate: Run = serde_json::from_str(&text).context("malformed run document")?;
            let receipt = ingestor.ingest(candidate).await?;
            print_json(&receipt)?;
            Ok(exit_code(receipt.has_failures()))
        },

        Command::Import { data_js } => {
            let document = LegacyDocument::load(&data_js)
                .await
                .with_context(|| format!("failed to read benchmark data {}", data_js.display()))?;
            let summary = ingestor.import_legacy(document).await?;
            print_json(&summary)?;
            Ok(exit_code(0 < summary.failures))
        },

        Command::Series { tool, name, last, from, to } => {
            let window = SeriesWindow { last, from, to };
            let series = query.series(&tool, &name, &window);
            print_json(&series)?;
            Ok(ExitCode::SUCCESS)
        },

        Command::Benchmarks { tool } => {
            print_json(&query.known_benchmarks(&tool))?;
            Ok(ExitCode::SUCCESS)
        },

        Command::Tools => {
            print_json(&query.known_tools())?;
            Ok(ExitCode::SUCCESS)
        },

        Command::Alerts { since } => {
            print_json(&query.alerts(since))?;
            Ok(ExitCode::SUCCESS)
        },

        Command::Export { out, group, max_items } => {
            let mut export = settings.export.clone();
            if let Some(group) = group {
                export.group = group;
            }
            if max_items.is_some() {
                export.max_items = max_items;
            }

            let document = query.export_legacy(&export);
            document
                .save(&out)
                .await
                .with_context(|| format!("failed to write benchmark data {}", out.display()))?;
            print_json(&serde_json::json!({ "out": out, "entries": document.nr_entries() }))?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
