use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::analysis::{Assessment, RegressionAnalyzer, Verdict};
use crate::elements::{Alert, Run, RunKey, SeriesKey, SeriesPoint, Severity};
use crate::error::{AnalysisError, BenchwatchError, MetricLabel, StoreError};
use crate::legacy::LegacyDocument;
use crate::query::QueryService;
use crate::settings::Settings;
use crate::store::{make_run_log, Appended, RunLog, SeriesStore};
use crate::validation::{self, ValidationPolicy};
use crate::BenchwatchResult;

mod alert_book;

pub use alert_book::AlertBook;

pub(crate) static RUNS_INGESTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("benchwatch_runs_ingested", "Number of benchmark runs accepted into the store"),
        &["tool"],
    )
    .expect("failed creating benchwatch_runs_ingested metric")
});

pub(crate) static DUPLICATE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("benchwatch_duplicate_runs", "Number of repeated run deliveries ignored"),
        &["tool"],
    )
    .expect("failed creating benchwatch_duplicate_runs metric")
});

pub(crate) static RUNS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("benchwatch_runs_rejected", "Number of benchmark runs rejected, by error"),
        &["error"],
    )
    .expect("failed creating benchwatch_runs_rejected metric")
});

pub(crate) static ALERTS_RAISED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("benchwatch_alerts_raised", "Number of regression alerts raised"),
        &["tool", "severity"],
    )
    .expect("failed creating benchwatch_alerts_raised metric")
});

#[inline]
fn track_ingested(tool: &str, receipt: &IngestReceipt) {
    RUNS_INGESTED.with_label_values(&[tool]).inc();
    for alert in receipt.alerts.iter() {
        ALERTS_RAISED
            .with_label_values(&[tool, alert.severity.to_string().as_str()])
            .inc();
    }
}

#[inline]
fn track_duplicate(tool: &str) {
    DUPLICATE_RUNS.with_label_values(&[tool]).inc();
}

#[inline]
fn track_rejection(error: &dyn MetricLabel) {
    RUNS_REJECTED.with_label_values(&[error.label().as_ref()]).inc();
}

/// Anomaly observed while assessing a point that did not yield a verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub tool: String,
    pub benchmark_name: String,
    pub commit_id: String,
    pub kind: String,
    pub message: String,
}

impl Diagnostic {
    fn new(key: &SeriesKey, point: &SeriesPoint, error: &AnalysisError) -> Self {
        Self {
            tool: key.tool.clone(),
            benchmark_name: key.name.clone(),
            commit_id: point.commit_id.clone(),
            kind: error.label().into_owned(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub run_key: RunKey,
    /// Ingestion sequence assigned to the run; absent for a repeated delivery.
    pub sequence: Option<u64>,
    pub duplicate: bool,
    pub alerts: Vec<Alert>,
    pub diagnostics: Vec<Diagnostic>,
}

impl IngestReceipt {
    fn duplicate(run_key: RunKey) -> Self {
        Self { run_key, sequence: None, duplicate: true, alerts: Vec::new(), diagnostics: Vec::new() }
    }

    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.alerts.iter().any(|a| a.severity == Severity::Failure)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub ingested: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub alerts: usize,
    pub failures: usize,
}

/// Validates, stores and assesses incoming runs.
///
/// Ingestion for one tool is serialized from the append through the recording of verdicts, so
/// the regression flag of a preceding point is settled before the next point looks at it.
#[derive(Debug)]
pub struct Ingestor {
    policy: ValidationPolicy,
    store: Arc<SeriesStore>,
    analyzer: RegressionAnalyzer,
    book: Arc<AlertBook>,
    partitions: DashMap<String, Arc<Mutex<()>>>,
}

impl Ingestor {
    pub async fn open(settings: &Settings) -> BenchwatchResult<Self> {
        let log = make_run_log(&settings.store)?;
        Self::restore(log, settings).await
    }

    /// Rebuilds series, regression flags and alerts by replaying the run log through the analyzer
    /// under the given settings.
    #[tracing::instrument(level = "info", skip(log, settings))]
    pub async fn restore(log: Box<dyn RunLog>, settings: &Settings) -> BenchwatchResult<Self> {
        let analyzer = RegressionAnalyzer::new(settings.analysis.clone())?;
        let book = Arc::new(AlertBook::default());

        let mut nr_diagnostics = 0;
        let store = SeriesStore::restore(log, settings.store.write_timeout, analyzer.lookback(), |appended| {
            let receipt = evaluate(&analyzer, &book, appended);
            if !receipt.diagnostics.is_empty() {
                tracing::debug!(
                    run_key=%receipt.run_key, diagnostics=?receipt.diagnostics,
                    "replayed run could not be fully assessed."
                );
            }
            nr_diagnostics += receipt.diagnostics.len();
        })
        .await?;

        tracing::info!(
            nr_runs=%store.len(), nr_alerts=%book.len(), %nr_diagnostics,
            "benchmark history restored."
        );
        Ok(Self {
            policy: settings.validation.clone(),
            store: Arc::new(store),
            analyzer,
            book,
            partitions: DashMap::default(),
        })
    }

    /// Ingests one candidate run. A repeated delivery of an already recorded run succeeds with a
    /// receipt marked `duplicate` and changes nothing.
    #[tracing::instrument(level = "info", skip(self, candidate), fields(run_key=%candidate.key()))]
    pub async fn ingest(&self, candidate: Run) -> BenchwatchResult<IngestReceipt> {
        let run = validation::validate(candidate, &self.policy).map_err(|err| {
            tracing::warn!(error=?err, "rejecting invalid run.");
            track_rejection(&err);
            err
        })?;

        let tool = run.tool.clone();
        let partition = self.partition(&tool);
        let _partition_guard = partition.lock().await;

        // verdicts are recorded before the run becomes visible to readers
        let appended = self
            .store
            .append_with(run, self.analyzer.lookback(), |appended| {
                evaluate(&self.analyzer, &self.book, appended)
            })
            .await;

        let receipt = match appended {
            Ok((_, receipt)) => receipt,
            Err(StoreError::DuplicateRun(run_key)) => {
                track_duplicate(&tool);
                return Ok(IngestReceipt::duplicate(run_key));
            },
            Err(err) => {
                tracing::error!(error=?err, "failed to append run to series store.");
                track_rejection(&err);
                return Err(err.into());
            },
        };

        track_ingested(&tool, &receipt);
        tracing::info!(
            sequence=?receipt.sequence, nr_alerts=%receipt.alerts.len(), nr_diagnostics=%receipt.diagnostics.len(),
            "run ingested."
        );
        Ok(receipt)
    }

    /// Ingests every run of a legacy benchmark data document in file order. Unreadable or invalid
    /// entries are skipped and counted; a store failure stops the import.
    #[tracing::instrument(level = "info", skip(self, document))]
    pub async fn import_legacy(&self, document: LegacyDocument) -> BenchwatchResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        for run in document.into_runs() {
            let run = match run {
                Ok(run) => run,
                Err(err) => {
                    tracing::warn!(error=?err, "skipping unreadable entry in benchmark data document.");
                    track_rejection(&err);
                    summary.rejected += 1;
                    continue;
                },
            };

            match self.ingest(run).await {
                Ok(receipt) if receipt.duplicate => summary.duplicates += 1,
                Ok(receipt) => {
                    summary.ingested += 1;
                    summary.alerts += receipt.alerts.len();
                    summary.failures += receipt.alerts.iter().filter(|a| a.severity == Severity::Failure).count();
                },
                Err(BenchwatchError::Validation(err)) => {
                    tracing::warn!(error=?err, "skipping invalid run in benchmark data document.");
                    summary.rejected += 1;
                },
                Err(err) => return Err(err),
            }
        }

        tracing::info!(?summary, "benchmark data document imported.");
        Ok(summary)
    }

    pub fn query(&self) -> QueryService {
        QueryService::new(Arc::clone(&self.store), Arc::clone(&self.book))
    }

    pub fn analyzer(&self) -> &RegressionAnalyzer {
        &self.analyzer
    }

    pub async fn close(self) -> BenchwatchResult<()> {
        match Arc::try_unwrap(self.store) {
            Ok(store) => store.close().await?,
            Err(_) => tracing::debug!("series store still shared by queries - leaving run log open."),
        }
        Ok(())
    }

    fn partition(&self, tool: &str) -> Arc<Mutex<()>> {
        self.partitions.entry(tool.to_string()).or_default().value().clone()
    }
}

fn evaluate(analyzer: &RegressionAnalyzer, book: &AlertBook, appended: &Appended) -> IngestReceipt {
    let run = &appended.run;
    let mut alerts = Vec::new();
    let mut diagnostics = Vec::new();

    for context in appended.contexts.iter() {
        let previous_flagged = context
            .prior
            .last()
            .map_or(false, |previous| book.is_flagged(&context.key, previous.sequence));

        match analyzer.assess(&context.key, &context.point, &context.prior, previous_flagged) {
            Assessment::Judged { verdict, baseline, ratio, raise_alert } => {
                if verdict == Verdict::Regression {
                    book.flag(&context.key, context.point.sequence);
                }

                if raise_alert {
                    let alert = analyzer.make_alert(
                        &context.key,
                        &run.commit,
                        run.recorded_at,
                        &context.point,
                        &baseline,
                        ratio,
                    );
                    tracing::warn!(?alert, "benchmark regression detected.");
                    book.record(alert.clone());
                    alerts.push(alert);
                }
            },
            Assessment::Inconclusive(err) if err.is_reportable() => {
                diagnostics.push(Diagnostic::new(&context.key, &context.point, &err));
            },
            Assessment::Inconclusive(_) => (),
        }
    }

    IngestReceipt {
        run_key: run.key(),
        sequence: Some(appended.sequence),
        duplicate: false,
        alerts,
        diagnostics,
    }
}
