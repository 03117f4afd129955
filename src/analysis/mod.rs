use serde::{Deserialize, Serialize};

use crate::elements::{Alert, Commit, PolarityCatalog, SeriesKey, SeriesPoint, Severity, Timestamp};
use crate::error::AnalysisError;

mod assessment;
mod baseline;

pub use assessment::{Assessment, Verdict};
pub use baseline::{Baseline, BaselineStatistic};

/// Comparable prior points required before any verdict.
pub const MIN_HISTORY: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Number of trailing comparable points the baseline is computed over.
    pub window: usize,
    /// Ratio beyond which a point counts as a regression, e.g. 1.1 for 10% worse.
    pub threshold: f64,
    /// Ratio at or beyond which a regression alert is graded a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_threshold: Option<f64>,
    pub statistic: BaselineStatistic,
    pub polarity: PolarityCatalog,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: 1.1,
            fail_threshold: None,
            statistic: BaselineStatistic::default(),
            polarity: PolarityCatalog::default(),
        }
    }
}

/// Decides whether a newly recorded point is a regression, an improvement or noise relative to the
/// trailing baseline of its series.
#[derive(Debug, Clone)]
pub struct RegressionAnalyzer {
    settings: AnalysisSettings,
}

impl RegressionAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Result<Self, AnalysisError> {
        if settings.window < MIN_HISTORY {
            return Err(AnalysisError::Settings {
                setting: "window".to_string(),
                message: format!("baseline window must cover at least {} points", MIN_HISTORY),
            });
        }

        if !settings.threshold.is_finite() || settings.threshold <= 1.0 {
            return Err(AnalysisError::Settings {
                setting: "threshold".to_string(),
                message: format!("threshold must be a finite ratio above 1.0 but was {}", settings.threshold),
            });
        }

        if let Some(fail) = settings.fail_threshold {
            if !fail.is_finite() || fail < settings.threshold {
                return Err(AnalysisError::Settings {
                    setting: "fail_threshold".to_string(),
                    message: format!("fail threshold {} must not be below threshold {}", fail, settings.threshold),
                });
            }
        }

        Ok(Self { settings })
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// How many preceding series entries an assessment looks at.
    pub fn lookback(&self) -> usize {
        self.settings.window
    }

    /// Assesses `candidate` against `prior`, the entries that precede it in its series (oldest
    /// first). `previous_flagged` tells whether the immediately preceding entry was itself judged a
    /// regression, in which case a continued regression does not raise another alert.
    #[tracing::instrument(
        level = "debug",
        skip(self, candidate, prior),
        fields(%key, commit_id=%candidate.commit_id, value=%candidate.value, nr_prior=%prior.len())
    )]
    pub fn assess(
        &self, key: &SeriesKey, candidate: &SeriesPoint, prior: &[SeriesPoint], previous_flagged: bool,
    ) -> Assessment {
        match self.judge(key, candidate, prior, previous_flagged) {
            Ok(assessment) => {
                tracing::debug!(?assessment, "benchmark point assessed.");
                assessment
            },
            Err(err) => {
                if err.is_reportable() {
                    tracing::warn!(error=?err, "no verdict for benchmark point.");
                } else {
                    tracing::debug!(error=?err, "no verdict for benchmark point.");
                }
                Assessment::Inconclusive(err)
            },
        }
    }

    fn judge(
        &self, key: &SeriesKey, candidate: &SeriesPoint, prior: &[SeriesPoint], previous_flagged: bool,
    ) -> Result<Assessment, AnalysisError> {
        if let Some(previous) = prior.last() {
            if previous.unit != candidate.unit {
                return Err(AnalysisError::UnitChange { from: previous.unit.clone(), to: candidate.unit.clone() });
            }
        }

        let comparable = Self::comparable_history(candidate, prior);
        if comparable.len() < MIN_HISTORY {
            return Err(AnalysisError::InsufficientHistory { supplied: comparable.len(), need: MIN_HISTORY });
        }

        let polarity = self
            .settings
            .polarity
            .resolve(key)
            .ok_or_else(|| AnalysisError::PolarityUndeclared(key.clone()))?;

        let window = &comparable[comparable.len().saturating_sub(self.settings.window)..];
        let baseline = Baseline::compute(self.settings.statistic, window)?;
        let ratio = polarity
            .ratio(baseline.value, candidate.value)
            .ok_or(AnalysisError::Incomparable { baseline: baseline.value, value: candidate.value })?;

        let verdict = self.classify(ratio);
        let raise_alert = verdict == Verdict::Regression && !previous_flagged;
        Ok(Assessment::Judged { verdict, baseline, ratio, raise_alert })
    }

    /// Trailing prior entries sharing the candidate's unit. Accumulation restarts at a unit change.
    fn comparable_history<'p>(candidate: &SeriesPoint, prior: &'p [SeriesPoint]) -> &'p [SeriesPoint] {
        let start = prior
            .iter()
            .rposition(|p| p.unit != candidate.unit)
            .map(|pos| pos + 1)
            .unwrap_or(0);
        &prior[start..]
    }

    fn classify(&self, ratio: f64) -> Verdict {
        if self.settings.threshold < ratio {
            Verdict::Regression
        } else if ratio < 1.0 / self.settings.threshold {
            Verdict::Improvement
        } else {
            Verdict::Noise
        }
    }

    pub fn severity(&self, ratio: f64) -> Severity {
        match self.settings.fail_threshold {
            Some(fail) if fail <= ratio => Severity::Failure,
            _ => Severity::Warning,
        }
    }

    pub fn make_alert(
        &self, key: &SeriesKey, commit: &Commit, raised_at: Timestamp, candidate: &SeriesPoint, baseline: &Baseline,
        ratio: f64,
    ) -> Alert {
        Alert {
            tool: key.tool.clone(),
            benchmark_name: key.name.clone(),
            commit: commit.clone(),
            previous_baseline: baseline.value,
            current_value: candidate.value,
            ratio,
            threshold: self.settings.threshold,
            unit: candidate.unit.clone(),
            severity: self.severity(ratio),
            raised_at,
        }
    }
}
