use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BenchmarkPoint, Commit, SeriesKey, Timestamp};

/// One ingestion event: the results a benchmark tool produced for a single commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub commit: Commit,
    pub tool: String,
    #[serde(default = "Timestamp::now")]
    pub recorded_at: Timestamp,
    pub points: Vec<BenchmarkPoint>,
}

impl Run {
    pub fn new(commit: Commit, tool: impl Into<String>, recorded_at: Timestamp, points: Vec<BenchmarkPoint>) -> Self {
        Self { commit, tool: tool.into(), recorded_at, points }
    }

    pub fn key(&self) -> RunKey {
        RunKey::new(&self.commit.id, &self.tool)
    }

    pub fn series_keys(&self) -> impl Iterator<Item = SeriesKey> + '_ {
        self.points.iter().map(move |p| SeriesKey::new(&self.tool, &p.name))
    }
}

/// Dedupe key of a run: a tool reports on a commit at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunKey {
    pub commit_id: String,
    pub tool: String,
}

impl RunKey {
    pub fn new(commit_id: impl Into<String>, tool: impl Into<String>) -> Self {
        Self { commit_id: commit_id.into(), tool: tool.into() }
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tool, self.commit_id)
    }
}
