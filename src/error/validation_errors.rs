use either::{Either, Left};
use thiserror::Error;

use super::MetricLabel;
use crate::SharedString;

/// Rejection of a candidate run. Each variant names the first offending field, e.g.
/// `points[3].value`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("required field {field} is empty")]
    EmptyField { field: String },

    #[error("field {field} is not a well-formed identifier: {value:?}")]
    MalformedIdentifier { field: String, value: String },

    #[error("field {field} is not a valid epoch milliseconds timestamp: {value}")]
    InvalidTimestamp { field: String, value: i64 },

    #[error("field {field} names an unknown benchmark tool: {tool:?}")]
    UnknownTool { field: String, tool: String },

    #[error("field {field} must hold at least one benchmark point")]
    NoPoints { field: String },

    #[error("field {field} must be a finite number but was {value}")]
    NonFiniteValue { field: String, value: f64 },

    #[error("field {field} repeats benchmark name {name:?} within the run")]
    DuplicateName { field: String, name: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::EmptyField { field }
            | Self::MalformedIdentifier { field, .. }
            | Self::InvalidTimestamp { field, .. }
            | Self::UnknownTool { field, .. }
            | Self::NoPoints { field }
            | Self::NonFiniteValue { field, .. }
            | Self::DuplicateName { field, .. } => field.as_str(),
        }
    }
}

impl MetricLabel for ValidationError {
    fn slug(&self) -> SharedString {
        "validation".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::EmptyField { .. } => Left("empty_field".into()),
            Self::MalformedIdentifier { .. } => Left("malformed_identifier".into()),
            Self::InvalidTimestamp { .. } => Left("invalid_timestamp".into()),
            Self::UnknownTool { .. } => Left("unknown_tool".into()),
            Self::NoPoints { .. } => Left("no_points".into()),
            Self::NonFiniteValue { .. } => Left("non_finite_value".into()),
            Self::DuplicateName { .. } => Left("duplicate_name".into()),
        }
    }
}
