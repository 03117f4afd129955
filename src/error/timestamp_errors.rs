use either::{Either, Left};
use thiserror::Error;

use super::MetricLabel;
use crate::SharedString;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("failed to parse timestamp from {rep:?}: {reason}")]
    Parse { rep: String, reason: String },
}

impl MetricLabel for TimestampError {
    fn slug(&self) -> SharedString {
        "timestamp".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::Parse { .. } => Left("parse".into()),
        }
    }
}
