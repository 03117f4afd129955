use serde::Serialize;
use strum_macros::Display;

use super::Baseline;
use crate::error::AnalysisError;

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Regression,
    Improvement,
    Noise,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    /// No verdict could be reached for the point.
    Inconclusive(AnalysisError),

    Judged {
        verdict: Verdict,
        baseline: Baseline,
        ratio: f64,
        /// Set only for a regression whose preceding point was not already flagged.
        raise_alert: bool,
    },
}

impl Assessment {
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Judged { verdict, .. } => Some(*verdict),
            Self::Inconclusive(_) => None,
        }
    }

    pub fn is_regression(&self) -> bool {
        self.verdict() == Some(Verdict::Regression)
    }

    pub fn raises_alert(&self) -> bool {
        matches!(self, Self::Judged { raise_alert: true, .. })
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Judged { ratio, .. } => Some(*ratio),
            Self::Inconclusive(_) => None,
        }
    }
}
