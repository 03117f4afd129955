use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form informational measurements (iteration counts, error margins, ...). Never used in
/// regression math.
pub type SecondaryStats = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPoint {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secondary_stats: SecondaryStats,
}

impl BenchmarkPoint {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            secondary_stats: SecondaryStats::default(),
        }
    }

    pub fn with_stat(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secondary_stats.insert(key.into(), value.into());
        self
    }
}
