use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::elements::{Alert, Series, SeriesKey, SeriesWindow, Timestamp};
use crate::ingest::AlertBook;
use crate::legacy::{LegacyDocument, DEFAULT_GROUP};
use crate::store::SeriesStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Benchmark group the exported entries are listed under.
    pub group: String,
    pub repo_url: String,
    /// Only the most recent entries are exported when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
            repo_url: String::default(),
            max_items: None,
        }
    }
}

/// Read-only view over the series store and the alerts raised so far. Only fully committed runs
/// are ever visible.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<SeriesStore>,
    book: Arc<AlertBook>,
}

impl QueryService {
    pub fn new(store: Arc<SeriesStore>, book: Arc<AlertBook>) -> Self {
        Self { store, book }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn series(&self, tool: &str, name: &str, window: &SeriesWindow) -> Series {
        self.store.series(&SeriesKey::new(tool, name), window)
    }

    pub fn known_benchmarks(&self, tool: &str) -> BTreeSet<String> {
        self.store.known_benchmarks(tool)
    }

    pub fn known_tools(&self) -> BTreeSet<String> {
        self.store.known_tools()
    }

    /// Alerts raised at or after `since`, oldest first.
    pub fn alerts(&self, since: Option<Timestamp>) -> Vec<Alert> {
        self.book.alerts(since)
    }

    /// Renders the accepted runs, in ingestion order, as a legacy benchmark data document.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn export_legacy(&self, settings: &ExportSettings) -> LegacyDocument {
        let runs = self.store.runs();
        let document = LegacyDocument::from_runs(
            &settings.group,
            &settings.repo_url,
            runs.iter().map(|r| r.as_ref()),
            settings.max_items,
        );
        tracing::info!(nr_runs=%runs.len(), nr_entries=%document.nr_entries(), "exported benchmark history.");
        document
    }
}
