use either::{Either, Left};
use thiserror::Error;

use super::MetricLabel;
use crate::elements::SeriesKey;
use crate::SharedString;

/// Reasons the analyzer cannot reach a verdict. None of these block an append; they downgrade to
/// "no alert".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("not enough history to establish a baseline - supplied:{supplied} need:{need}")]
    InsufficientHistory { supplied: usize, need: usize },

    #[error("unit changed from {from:?} to {to:?}; baseline accumulation restarts")]
    UnitChange { from: String, to: String },

    #[error("no polarity declared for benchmark {0}")]
    PolarityUndeclared(SeriesKey),

    #[error("value {value} cannot be compared against baseline {baseline}")]
    Incomparable { baseline: f64, value: f64 },

    #[error("invalid analysis setting {setting}: {message}")]
    Settings { setting: String, message: String },
}

impl AnalysisError {
    /// Insufficient history is the normal state of a young series and not worth reporting.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::InsufficientHistory { .. })
    }
}

impl MetricLabel for AnalysisError {
    fn slug(&self) -> SharedString {
        "analysis".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::InsufficientHistory { .. } => Left("insufficient_history".into()),
            Self::UnitChange { .. } => Left("unit_change".into()),
            Self::PolarityUndeclared(_) => Left("polarity_undeclared".into()),
            Self::Incomparable { .. } => Left("incomparable".into()),
            Self::Settings { .. } => Left("settings".into()),
        }
    }
}
