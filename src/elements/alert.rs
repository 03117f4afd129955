use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::{Commit, SeriesKey, Timestamp};

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Failure,
}

/// Regression raised for one benchmark of one run. `raised_at` is the run's ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub tool: String,
    pub benchmark_name: String,
    pub commit: Commit,
    pub previous_baseline: f64,
    pub current_value: f64,
    pub ratio: f64,
    pub threshold: f64,
    pub unit: String,
    pub severity: Severity,
    pub raised_at: Timestamp,
}

impl Alert {
    pub fn series_key(&self) -> SeriesKey {
        SeriesKey::new(&self.tool, &self.benchmark_name)
    }
}
