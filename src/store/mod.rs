use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec};
use tokio::sync::Mutex;

use crate::elements::{Run, RunKey, Series, SeriesKey, SeriesWindow};
use crate::error::StoreError;
use crate::validation::{self, ValidatedRun, ValidationPolicy};

mod index;
mod run_log;

pub use index::{PointContext, SeriesIndex};
pub use run_log::{
    make_run_log, FileRunLog, MemoryRunLog, RunLog, RunLogType, StoreSettings, RUN_LOG_FILENAME,
};

pub(crate) static STORE_APPEND_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "benchwatch_store_append_time_seconds",
            "Time spent durably appending a run to the series store",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["tool"],
    )
    .expect("failed creating benchwatch_store_append_time_seconds metric")
});

#[inline]
fn start_append_timer(tool: &str) -> HistogramTimer {
    STORE_APPEND_TIME.with_label_values(&[tool]).start_timer()
}

/// Result of a successful append.
#[derive(Debug, Clone)]
pub struct Appended {
    pub sequence: u64,
    pub run: Arc<Run>,
    pub contexts: Vec<PointContext>,
}

/// Append-only run log plus the derived series index built from it.
///
/// Appends for the same tool are serialized; appends for different tools proceed concurrently up to
/// the single index write section. Readers only ever observe whole runs.
pub struct SeriesStore {
    log: Box<dyn RunLog>,
    index: RwLock<SeriesIndex>,
    partitions: DashMap<String, Arc<Mutex<()>>>,
    write_timeout: Duration,
}

impl fmt::Debug for SeriesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesStore")
            .field("log", &self.log)
            .field("nr_runs", &self.len())
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

impl SeriesStore {
    pub async fn open(settings: &StoreSettings) -> Result<Self, StoreError> {
        let log = make_run_log(settings)?;
        Self::restore(log, settings.write_timeout, 0, |_| ()).await
    }

    /// Rebuilds the index by replaying the run log, handing every replayed run to `on_replay` as
    /// if it had just been appended with the given lookback.
    #[tracing::instrument(level = "info", skip(log, on_replay))]
    pub async fn restore<F>(
        log: Box<dyn RunLog>, write_timeout: Duration, lookback: usize, mut on_replay: F,
    ) -> Result<Self, StoreError>
    where
        F: FnMut(&Appended),
    {
        let mut index = SeriesIndex::default();
        let policy = ValidationPolicy::permissive();

        for (position, run) in log.replay().await?.into_iter().enumerate() {
            let run = validation::validate(run, &policy)
                .map_err(|err| StoreError::Corrupt { line: position + 1, reason: err.to_string() })?
                .into_inner();

            if index.contains(&run.key()) {
                tracing::warn!(run_key=%run.key(), "skipping repeated run found in run log.");
                continue;
            }

            let run = Arc::new(run);
            let sequence = index.next_sequence();
            let contexts = index.insert(Arc::clone(&run), lookback);
            on_replay(&Appended { sequence, run, contexts });
        }

        tracing::info!(nr_runs=%index.len(), "series store restored from run log.");
        Ok(Self {
            log,
            index: RwLock::new(index),
            partitions: DashMap::default(),
            write_timeout,
        })
    }

    /// Durably appends the run and indexes its points. `lookback` bounds how many preceding series
    /// entries are returned with each point.
    pub async fn append(&self, run: ValidatedRun, lookback: usize) -> Result<Appended, StoreError> {
        let (appended, ()) = self.append_with(run, lookback, |_| ()).await?;
        Ok(appended)
    }

    /// Appends as [`SeriesStore::append`] does, running `on_commit` inside the index write section
    /// so whatever it records is in place before any reader can observe the new run.
    #[tracing::instrument(level = "info", skip(self, run, on_commit), fields(run_key=%run.key()))]
    pub async fn append_with<F, T>(
        &self, run: ValidatedRun, lookback: usize, on_commit: F,
    ) -> Result<(Appended, T), StoreError>
    where
        F: FnOnce(&Appended) -> T,
    {
        let _timer = start_append_timer(&run.tool);
        let partition = self.partition(&run.tool);
        let _partition_guard = partition.lock().await;

        let key = run.key();
        if self.read_index().contains(&key) {
            tracing::info!(run_key=%key, "run already recorded - ignoring duplicate delivery.");
            return Err(StoreError::DuplicateRun(key));
        }

        let run = Arc::new(run.into_inner());
        match tokio::time::timeout(self.write_timeout, self.log.append(&run)).await {
            Ok(written) => written?,
            Err(_elapsed) => {
                tracing::error!(run_key=%key, write_timeout=?self.write_timeout, "run log write timed out.");
                self.abandon_write().await;
                return Err(StoreError::WriteTimeout(self.write_timeout));
            },
        }

        let mut index = self.write_index();
        let sequence = index.next_sequence();
        let contexts = index.insert(Arc::clone(&run), lookback);
        tracing::debug!(%sequence, nr_points=%contexts.len(), "run appended to series store.");
        let appended = Appended { sequence, run, contexts };
        let committed = on_commit(&appended);
        Ok((appended, committed))
    }

    /// The series for a key; empty when nothing has been recorded for it yet.
    pub fn series(&self, key: &SeriesKey, window: &SeriesWindow) -> Series {
        Series::new(key.clone(), self.read_index().series(key, window))
    }

    pub fn known_benchmarks(&self, tool: &str) -> BTreeSet<String> {
        self.read_index().benchmarks(tool)
    }

    pub fn known_tools(&self) -> BTreeSet<String> {
        self.read_index().tools()
    }

    pub fn contains(&self, key: &RunKey) -> bool {
        self.read_index().contains(key)
    }

    /// Snapshot of every accepted run in ingestion order.
    pub fn runs(&self) -> Vec<Arc<Run>> {
        self.read_index().runs()
    }

    pub fn len(&self) -> usize {
        self.read_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_index().is_empty()
    }

    pub async fn close(self) -> Result<(), StoreError> {
        self.log.close().await
    }

    /// Discards a timed out write so it cannot resurface when the log is replayed. Bounded by the
    /// write timeout; anything left over is cut away before the next append or on close.
    async fn abandon_write(&self) {
        match tokio::time::timeout(self.write_timeout, self.log.rollback()).await {
            Ok(Ok(())) => (),
            Ok(Err(err)) => tracing::error!(error=?err, "failed to roll back timed out run log write."),
            Err(_elapsed) => tracing::warn!("run log rollback still pending - deferring to next append or close."),
        }
    }

    fn partition(&self, tool: &str) -> Arc<Mutex<()>> {
        self.partitions.entry(tool.to_string()).or_default().value().clone()
    }

    fn read_index(&self) -> RwLockReadGuard<'_, SeriesIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, SeriesIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use claim::*;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::elements::{BenchmarkPoint, Commit, Timestamp};

    fn make_run(id: &str, tool: &str, commit_ts: i64, values: &[(&str, f64)]) -> ValidatedRun {
        let run = Run::new(
            Commit::new(id, Timestamp::from_millis(commit_ts)),
            tool,
            Timestamp::from_millis(commit_ts + 60_000),
            values.iter().map(|(n, v)| BenchmarkPoint::new(*n, *v, "ns/iter")).collect(),
        );
        assert_ok!(validation::validate(run, &ValidationPolicy::permissive()))
    }

    async fn memory_store() -> SeriesStore {
        assert_ok!(SeriesStore::open(&StoreSettings::default()).await)
    }

    #[tokio::test]
    async fn test_first_seen_benchmark_is_empty_series() {
        let store = memory_store().await;
        let series = store.series(&SeriesKey::new("googlecpp", "bench_text/120_num_fts"), &SeriesWindow::all());
        assert!(series.is_empty());
        assert!(store.known_benchmarks("googlecpp").is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_append_leaves_series_unchanged() {
        let store = memory_store().await;
        let run = make_run("ea278c49", "googlecpp", 1_664_815_313_000, &[("a", 100.0), ("b", 200.0)]);

        assert_ok!(store.append(run.clone(), 5).await);
        let key = SeriesKey::new("googlecpp", "a");
        let once = store.series(&key, &SeriesWindow::all());

        let err = assert_err!(store.append(run, 5).await);
        assert!(matches!(err, StoreError::DuplicateRun(ref k) if k == &RunKey::new("ea278c49", "googlecpp")));
        assert_eq!(store.series(&key, &SeriesWindow::all()), once);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_same_commit_different_tools_are_distinct() {
        let store = memory_store().await;
        assert_ok!(store.append(make_run("ea278c49", "googlecpp", 1_000, &[("a", 1.0)]), 5).await);
        assert_ok!(store.append(make_run("ea278c49", "benchmarkdotnet", 1_000, &[("a", 2.0)]), 5).await);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.known_tools(),
            maplit::btreeset! { "benchmarkdotnet".to_string(), "googlecpp".to_string() }
        );
    }

    #[derive(Debug, Default)]
    struct StalledLog {
        rolled_back: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RunLog for StalledLog {
        async fn replay(&self) -> Result<Vec<Run>, StoreError> {
            Ok(Vec::new())
        }

        async fn append(&self, _run: &Run) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn rollback(&self) -> Result<(), StoreError> {
            self.rolled_back.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn close(self: Box<Self>) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_write_surfaces_unavailable() {
        let log = StalledLog::default();
        let rolled_back = Arc::clone(&log.rolled_back);
        let store = assert_ok!(SeriesStore::restore(Box::new(log), Duration::from_millis(20), 0, |_| ()).await);
        let err = assert_err!(store.append(make_run("ea278c49", "googlecpp", 1_000, &[("a", 1.0)]), 5).await);
        assert!(err.is_unavailable());
        assert!(rolled_back.load(Ordering::SeqCst));
        assert!(store.is_empty());
        assert!(store.series(&SeriesKey::new("googlecpp", "a"), &SeriesWindow::all()).is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_write_is_not_replayed() {
        let dir = assert_ok!(tempfile::tempdir());
        let mut acknowledged = BTreeSet::new();

        for (n, micros) in [1, 5, 10, 25, 50, 100, 200, 400, 1_000, 5_000].into_iter().enumerate() {
            let log = assert_ok!(FileRunLog::open(dir.path()));
            let store = assert_ok!(SeriesStore::restore(Box::new(log), Duration::from_micros(micros), 0, |_| ()).await);

            let id = format!("c0ffee{:02}", n);
            let run = make_run(&id, "googlecpp", 1_000 + n as i64, &[("a", 1.0)]);
            match store.append(run, 5).await {
                Ok(_) => {
                    acknowledged.insert(id);
                },
                Err(err) => assert!(matches!(err, StoreError::WriteTimeout(_))),
            }
            assert_ok!(store.close().await);
        }

        let log = assert_ok!(FileRunLog::open(dir.path()));
        let replayed: BTreeSet<String> = assert_ok!(log.replay().await).into_iter().map(|r| r.commit.id).collect();
        assert_eq!(replayed, acknowledged);
    }

    #[tokio::test]
    async fn test_append_with_returns_commit_output() {
        let store = memory_store().await;
        let run = make_run("ea278c49", "googlecpp", 1_000, &[("a", 1.0), ("b", 2.0)]);

        let (appended, nr_points) = assert_ok!(store.append_with(run, 5, |appended| appended.contexts.len()).await);
        assert_eq!(nr_points, 2);
        assert_eq!(appended.sequence, 0);
        assert_eq!(store.len(), 1);

        let err = assert_err!(
            store
                .append_with(make_run("ea278c49", "googlecpp", 1_000, &[("a", 1.0)]), 5, |_| {
                    panic!("duplicate delivery must not reach on_commit")
                })
                .await
        );
        assert!(matches!(err, StoreError::DuplicateRun(_)));
    }
}
