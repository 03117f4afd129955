use std::collections::{BTreeSet, HashSet};
use std::ops::Deref;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::elements::{BenchmarkPoint, Run, RunKey, Timestamp};
use crate::error::ValidationError;

pub const MAX_IDENTIFIER_LEN: usize = 128;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("failed to create identifier regex"));

/// Run that passed validation. The series store only accepts runs in this form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRun(Run);

impl ValidatedRun {
    pub fn key(&self) -> RunKey {
        self.0.key()
    }

    pub fn into_inner(self) -> Run {
        self.0
    }
}

impl Deref for ValidatedRun {
    type Target = Run;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Run> for ValidatedRun {
    fn as_ref(&self) -> &Run {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Benchmark tools accepted for ingestion. Any non-empty tool is accepted when empty.
    pub known_tools: BTreeSet<String>,
}

impl ValidationPolicy {
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn with_known_tools<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { known_tools: tools.into_iter().map(|t| t.into()).collect() }
    }

    pub fn is_known_tool(&self, tool: &str) -> bool {
        self.known_tools.is_empty() || self.known_tools.contains(tool)
    }
}

/// Checks a candidate run for structural well-formedness, reporting the first offending field.
#[tracing::instrument(level = "debug", skip(candidate, policy), fields(run=%candidate.key()))]
pub fn validate(candidate: Run, policy: &ValidationPolicy) -> Result<ValidatedRun, ValidationError> {
    check_identifier("commit.id", &candidate.commit.id)?;
    check_timestamp("commit.timestamp", candidate.commit.timestamp)?;
    check_tool("tool", &candidate.tool, policy)?;
    check_timestamp("recordedAt", candidate.recorded_at)?;

    if candidate.points.is_empty() {
        return Err(ValidationError::NoPoints { field: "points".to_string() });
    }

    let mut seen = HashSet::with_capacity(candidate.points.len());
    for (position, point) in candidate.points.iter().enumerate() {
        check_point(position, point)?;
        if !seen.insert(point.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                field: format!("points[{}].name", position),
                name: point.name.clone(),
            });
        }
    }

    Ok(ValidatedRun(candidate))
}

fn check_identifier(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: field.to_string() });
    }

    if MAX_IDENTIFIER_LEN < id.len() || !IDENTIFIER.is_match(id) {
        return Err(ValidationError::MalformedIdentifier { field: field.to_string(), value: id.to_string() });
    }

    Ok(())
}

fn check_timestamp(field: &str, timestamp: Timestamp) -> Result<(), ValidationError> {
    if !timestamp.is_valid_epoch() {
        return Err(ValidationError::InvalidTimestamp { field: field.to_string(), value: timestamp.as_millis() });
    }

    Ok(())
}

fn check_tool(field: &str, tool: &str, policy: &ValidationPolicy) -> Result<(), ValidationError> {
    if tool.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: field.to_string() });
    }

    if !policy.is_known_tool(tool) {
        return Err(ValidationError::UnknownTool { field: field.to_string(), tool: tool.to_string() });
    }

    Ok(())
}

fn check_point(position: usize, point: &BenchmarkPoint) -> Result<(), ValidationError> {
    let field = |name: &str| format!("points[{}].{}", position, name);

    if point.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: field("name") });
    }

    if !point.value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: field("value"), value: point.value });
    }

    if point.unit.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: field("unit") });
    }

    Ok(())
}
