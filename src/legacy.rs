//! Reads and writes the `data.js` benchmark history kept by github-action-benchmark, so existing
//! history can be imported and dashboards built on that file keep working.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::elements::{Author, BenchmarkPoint, Commit, Run, SecondaryStats, Timestamp};
use crate::error::LegacyError;

pub const DATA_JS_PREFIX: &str = "window.BENCHMARK_DATA = ";
pub const DEFAULT_GROUP: &str = "Benchmark";

const RANGE_STAT: &str = "range";
const EXTRA_STAT: &str = "extra";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
    pub last_update: Timestamp,
    #[serde(default)]
    pub repo_url: String,
    /// Benchmark groups in file order, each holding its entries in the order they were recorded.
    pub entries: IndexMap<String, Vec<LegacyEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub commit: LegacyCommit,
    pub date: Timestamp,
    pub tool: String,
    pub benches: Vec<LegacyBench>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCommit {
    #[serde(default)]
    pub author: LegacyAuthor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<LegacyAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    pub id: String,
    #[serde(default)]
    pub message: String,
    /// RFC 3339 commit time, usually carrying the committer's offset.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_id: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAuthor {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBench {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl LegacyDocument {
    /// Parses a `data.js` document. The `window.BENCHMARK_DATA =` assignment and a trailing `;`
    /// are optional, so plain JSON is accepted too.
    pub fn parse(text: &str) -> Result<Self, LegacyError> {
        let body = text.trim();
        let body = match body.strip_prefix("window.BENCHMARK_DATA") {
            Some(rest) => rest.trim_start().trim_start_matches('='),
            None => body,
        };
        let body = body.trim().trim_end_matches(';');
        Ok(serde_json::from_str(body)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LegacyError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    /// Converts every entry to a run, in file order. An entry that cannot be converted yields its
    /// own error and does not affect the others.
    pub fn into_runs(self) -> Vec<Result<Run, LegacyError>> {
        self.entries
            .into_values()
            .flatten()
            .map(|entry| entry.into_run())
            .collect()
    }

    /// Builds a document holding `runs` as a single group, keeping only the trailing `max_items`
    /// entries when set.
    pub fn from_runs<'r, I>(group: &str, repo_url: &str, runs: I, max_items: Option<usize>) -> Self
    where
        I: IntoIterator<Item = &'r Run>,
    {
        let mut entries: Vec<LegacyEntry> = runs.into_iter().map(LegacyEntry::from).collect();
        if let Some(max_items) = max_items {
            let excess = entries.len().saturating_sub(max_items);
            entries.drain(..excess);
        }

        let last_update = entries.iter().map(|e| e.date).max().unwrap_or_else(Timestamp::now);

        Self {
            last_update,
            repo_url: repo_url.to_string(),
            entries: std::iter::once((group.to_string(), entries)).collect(),
        }
    }

    pub fn nr_entries(&self) -> usize {
        self.entries.values().map(|e| e.len()).sum()
    }

    pub fn to_data_js(&self) -> Result<String, LegacyError> {
        Ok(format!("{}{}", DATA_JS_PREFIX, serde_json::to_string_pretty(self)?))
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), LegacyError> {
        tokio::fs::write(path, self.to_data_js()?).await?;
        Ok(())
    }
}

impl LegacyEntry {
    fn into_run(self) -> Result<Run, LegacyError> {
        let timestamp = Timestamp::from_str(&self.commit.timestamp).map_err(|source| {
            LegacyError::CommitTimestamp { commit: self.commit.id.clone(), source }
        })?;

        let commit = Commit {
            id: self.commit.id,
            timestamp,
            message: self.commit.message,
            author: self.commit.author.into(),
            committer: self.commit.committer.map(|c| c.into()),
            tree_id: self.commit.tree_id,
            url: self.commit.url,
        };

        let points = self.benches.into_iter().map(|b| b.into()).collect();
        Ok(Run::new(commit, self.tool, self.date, points))
    }
}

impl From<&Run> for LegacyEntry {
    fn from(run: &Run) -> Self {
        let commit = LegacyCommit {
            author: (&run.commit.author).into(),
            committer: run.commit.committer.as_ref().map(|c| c.into()),
            distinct: None,
            id: run.commit.id.clone(),
            message: run.commit.message.clone(),
            timestamp: run.commit.timestamp.to_rfc3339(),
            tree_id: run.commit.tree_id.clone(),
            url: run.commit.url.clone(),
        };

        Self {
            commit,
            date: run.recorded_at,
            tool: run.tool.clone(),
            benches: run.points.iter().map(|p| p.into()).collect(),
        }
    }
}

impl From<LegacyAuthor> for Author {
    fn from(author: LegacyAuthor) -> Self {
        Self { name: author.name, email: author.email, username: author.username }
    }
}

impl From<&Author> for LegacyAuthor {
    fn from(author: &Author) -> Self {
        Self {
            email: author.email.clone(),
            name: author.name.clone(),
            username: author.username.clone(),
        }
    }
}

impl From<LegacyBench> for BenchmarkPoint {
    fn from(bench: LegacyBench) -> Self {
        let mut secondary_stats = bench.extra.as_deref().map(parse_extra).unwrap_or_default();
        if let Some(range) = bench.range {
            secondary_stats.insert(RANGE_STAT.to_string(), range);
        }

        Self { name: bench.name, value: bench.value, unit: bench.unit, secondary_stats }
    }
}

impl From<&BenchmarkPoint> for LegacyBench {
    fn from(point: &BenchmarkPoint) -> Self {
        let range = point.secondary_stats.get(RANGE_STAT).cloned();
        let extra = match point.secondary_stats.get(EXTRA_STAT) {
            Some(raw) => Some(raw.clone()),
            None => {
                let lines: Vec<String> = point
                    .secondary_stats
                    .iter()
                    .filter(|(k, _)| k.as_str() != RANGE_STAT)
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                if lines.is_empty() {
                    None
                } else {
                    Some(lines.join("\n"))
                }
            },
        };

        Self {
            name: point.name.clone(),
            value: point.value,
            unit: point.unit.clone(),
            range,
            extra,
        }
    }
}

/// Splits `key: value` lines into individual stats. Text in any other shape is kept whole.
fn parse_extra(extra: &str) -> SecondaryStats {
    let pairs: Option<SecondaryStats> = extra
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_once(':')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .filter(|(k, _)| !k.is_empty())
        })
        .collect();

    match pairs {
        Some(stats) if !stats.is_empty() => stats,
        _ => std::iter::once((EXTRA_STAT.to_string(), extra.to_string())).collect(),
    }
}
