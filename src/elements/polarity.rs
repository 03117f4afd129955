use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::SeriesKey;

/// Which direction of change counts as better for a benchmark. Not inferable from units, so it is
/// declared through configuration.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    LowerIsBetter,
    HigherIsBetter,
}

impl Polarity {
    /// Ratio of the new value against the baseline oriented so that values above 1.0 are worse.
    /// Returns `None` when the division is not meaningful.
    pub fn ratio(&self, baseline: f64, value: f64) -> Option<f64> {
        let (numerator, denominator) = match self {
            Self::LowerIsBetter => (value, baseline),
            Self::HigherIsBetter => (baseline, value),
        };

        if denominator <= 0.0 || numerator < 0.0 {
            return None;
        }

        let ratio = numerator / denominator;
        if ratio.is_finite() {
            Some(ratio)
        } else {
            None
        }
    }
}

/// Declares the polarity of benchmarks matching `benchmark` (an exact name or a `*` glob) for
/// `tool`, or for every tool when `tool` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolarityRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub benchmark: String,
    pub polarity: Polarity,
}

impl PolarityRule {
    pub fn new(tool: Option<&str>, benchmark: impl Into<String>, polarity: Polarity) -> Self {
        Self { tool: tool.map(|t| t.to_string()), benchmark: benchmark.into(), polarity }
    }

    fn is_glob(&self) -> bool {
        self.benchmark.contains('*')
    }

    fn applies_to_tool(&self, tool: &str) -> bool {
        self.tool.as_deref().map_or(true, |t| t == tool)
    }

    fn matches(&self, key: &SeriesKey) -> bool {
        if !self.applies_to_tool(&key.tool) {
            return false;
        }

        if !self.is_glob() {
            return self.benchmark == key.name;
        }

        let pattern = format!("^{}$", self.benchmark.split('*').map(regex::escape).join(".*"));
        Regex::new(&pattern).map(|re| re.is_match(&key.name)).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarityCatalog {
    #[serde(default)]
    pub rules: Vec<PolarityRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Polarity>,
}

impl PolarityCatalog {
    pub fn new(rules: Vec<PolarityRule>) -> Self {
        Self { rules, default: None }
    }

    pub fn with_default(self, default: Polarity) -> Self {
        Self { default: Some(default), ..self }
    }

    /// Exact-name rules win over globs; globs are tried in declaration order; the catalog default
    /// applies last.
    pub fn resolve(&self, key: &SeriesKey) -> Option<Polarity> {
        let exact = self.rules.iter().filter(|r| !r.is_glob()).find(|r| r.matches(key));
        let glob = || self.rules.iter().filter(|r| r.is_glob()).find(|r| r.matches(key));

        exact.or_else(glob).map(|r| r.polarity).or(self.default)
    }
}
