use std::fmt::Debug;

use either::{Either, Left, Right};
use thiserror::Error;

use crate::SharedString;

mod analysis_errors;
mod legacy_errors;
mod settings_errors;
mod store_errors;
mod timestamp_errors;
mod validation_errors;

pub use analysis_errors::AnalysisError;
pub use legacy_errors::LegacyError;
pub use settings_errors::SettingsError;
pub use store_errors::StoreError;
pub use timestamp_errors::TimestampError;
pub use validation_errors::ValidationError;

/// Hierarchical label of an error, e.g. `benchwatch::store::duplicate_run`, used to tag metrics.
pub trait MetricLabel {
    fn label(&self) -> SharedString {
        match self.next() {
            Either::Right(n) => format!("{}::{}", self.slug(), n.label()).into(),
            Either::Left(ls) => format!("{}::{}", self.slug(), ls).into(),
        }
    }

    fn slug(&self) -> SharedString;
    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>>;
}

#[derive(Debug, Error)]
pub enum BenchwatchError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Legacy(#[from] LegacyError),

    #[error("{0}")]
    Metrics(#[from] prometheus::Error),
}

impl BenchwatchError {
    /// The caller may retry the same request later with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_unavailable())
    }
}

impl MetricLabel for BenchwatchError {
    fn slug(&self) -> SharedString {
        "benchwatch".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::Validation(e) => Right(Box::new(e)),
            Self::Store(e) => Right(Box::new(e)),
            Self::Analysis(e) => Right(Box::new(e)),
            Self::Settings(e) => Right(Box::new(e)),
            Self::Legacy(e) => Right(Box::new(e)),
            Self::Metrics(_) => Left("prometheus".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::elements::RunKey;

    #[test]
    fn test_error_labels() {
        let err: BenchwatchError = StoreError::DuplicateRun(RunKey::new("ea278c49", "googlecpp")).into();
        assert_eq!(err.label(), "benchwatch::store::duplicate_run");
        assert!(!err.is_retryable());

        let err: BenchwatchError = ValidationError::NoPoints { field: "points".to_string() }.into();
        assert_eq!(err.label(), "benchwatch::validation::no_points");

        let err: BenchwatchError = StoreError::WriteTimeout(std::time::Duration::from_millis(50)).into();
        assert_eq!(err.label(), "benchwatch::store::unavailable");
        assert!(err.is_retryable());
    }
}
