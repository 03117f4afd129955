use std::fmt;

use serde::{Deserialize, Serialize};

use super::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub tool: String,
    pub name: String,
}

impl SeriesKey {
    pub fn new(tool: impl Into<String>, name: impl Into<String>) -> Self {
        Self { tool: tool.into(), name: name.into() }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tool, self.name)
    }
}

/// One recorded value of a series. `sequence` is the ingestion sequence of the run that carried it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub commit_id: String,
    pub commit_timestamp: Timestamp,
    pub recorded_at: Timestamp,
    pub sequence: u64,
    pub value: f64,
    pub unit: String,
}

impl SeriesPoint {
    /// Series are ordered by commit timestamp, ties broken by ingestion order.
    pub fn order_key(&self) -> (Timestamp, u64) {
        (self.commit_timestamp, self.sequence)
    }
}

/// Position in a series where the unit differs from the preceding point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitChange {
    pub position: usize,
    pub commit_id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: SeriesKey,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(key: SeriesKey, points: Vec<SeriesPoint>) -> Self {
        Self { key, points }
    }

    pub fn empty(key: SeriesKey) -> Self {
        Self::new(key, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Units are carried per point and never coerced; every change in unit is reported here.
    pub fn unit_changes(&self) -> Vec<UnitChange> {
        self.points
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].unit != pair[1].unit)
            .map(|(i, pair)| UnitChange {
                position: i + 1,
                commit_id: pair[1].commit_id.clone(),
                from: pair[0].unit.clone(),
                to: pair[1].unit.clone(),
            })
            .collect()
    }
}

/// Optional truncation of a series. Time bounds are inclusive and apply to commit timestamps;
/// `last` then keeps only the trailing points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesWindow {
    pub last: Option<usize>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl SeriesWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn last(n: usize) -> Self {
        Self { last: Some(n), ..Self::default() }
    }

    pub fn between(from: Timestamp, to: Timestamp) -> Self {
        Self { from: Some(from), to: Some(to), ..Self::default() }
    }

    pub fn apply<'p>(&self, points: &'p [SeriesPoint]) -> &'p [SeriesPoint] {
        let start = self
            .from
            .map(|from| points.partition_point(|p| p.commit_timestamp < from))
            .unwrap_or(0);
        let end = self
            .to
            .map(|to| points.partition_point(|p| p.commit_timestamp <= to))
            .unwrap_or(points.len());

        let bounded = if start < end { &points[start..end] } else { &points[0..0] };
        match self.last {
            Some(n) => &bounded[bounded.len().saturating_sub(n)..],
            None => bounded,
        }
    }
}
