use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::elements::{Run, RunKey, SeriesKey, SeriesPoint, SeriesWindow};

/// A point placed into its series, along with the entries that preceded it at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct PointContext {
    pub key: SeriesKey,
    pub point: SeriesPoint,
    /// Up to the requested lookback of entries ordered before `point`, oldest first.
    pub prior: Vec<SeriesPoint>,
}

/// Derived (tool, benchmark) -> series lookup. Fully reconstructible by re-inserting the run log in
/// order.
#[derive(Debug, Default)]
pub struct SeriesIndex {
    runs: Vec<Arc<Run>>,
    keys: HashSet<RunKey>,
    series: HashMap<String, BTreeMap<String, Vec<SeriesPoint>>>,
}

impl SeriesIndex {
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn contains(&self, key: &RunKey) -> bool {
        self.keys.contains(key)
    }

    pub fn next_sequence(&self) -> u64 {
        self.runs.len() as u64
    }

    /// Adds the run under the next sequence number. The caller guarantees the run key is new.
    pub fn insert(&mut self, run: Arc<Run>, lookback: usize) -> Vec<PointContext> {
        let sequence = self.next_sequence();
        let tool_series = self.series.entry(run.tool.clone()).or_default();

        let contexts = run
            .points
            .iter()
            .map(|p| {
                let point = SeriesPoint {
                    commit_id: run.commit.id.clone(),
                    commit_timestamp: run.commit.timestamp,
                    recorded_at: run.recorded_at,
                    sequence,
                    value: p.value,
                    unit: p.unit.clone(),
                };

                let entries = tool_series.entry(p.name.clone()).or_default();
                let order = point.order_key();
                let position = entries.partition_point(|e| e.order_key() <= order);
                let prior = entries[position.saturating_sub(lookback)..position].to_vec();
                entries.insert(position, point.clone());

                PointContext { key: SeriesKey::new(&run.tool, &p.name), point, prior }
            })
            .collect();

        self.keys.insert(run.key());
        self.runs.push(run);
        contexts
    }

    pub fn series(&self, key: &SeriesKey, window: &SeriesWindow) -> Vec<SeriesPoint> {
        self.series
            .get(&key.tool)
            .and_then(|tool_series| tool_series.get(&key.name))
            .map(|entries| window.apply(entries).to_vec())
            .unwrap_or_default()
    }

    pub fn benchmarks(&self, tool: &str) -> BTreeSet<String> {
        self.series
            .get(tool)
            .map(|tool_series| tool_series.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn tools(&self) -> BTreeSet<String> {
        self.series.keys().cloned().collect()
    }

    pub fn runs(&self) -> Vec<Arc<Run>> {
        self.runs.clone()
    }
}
