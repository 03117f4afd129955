use either::{Either, Left, Right};
use thiserror::Error;

use super::{MetricLabel, TimestampError};
use crate::SharedString;

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("failed to read benchmark data document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid commit timestamp for {commit}: {source}")]
    CommitTimestamp {
        commit: String,
        #[source]
        source: TimestampError,
    },

    #[error("IO failure on benchmark data document: {0}")]
    IO(#[from] std::io::Error),
}

impl MetricLabel for LegacyError {
    fn slug(&self) -> SharedString {
        "legacy".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::Json(_) => Left("json".into()),
            Self::CommitTimestamp { source, .. } => Right(Box::new(source)),
            Self::IO(_) => Left("io".into()),
        }
    }
}
