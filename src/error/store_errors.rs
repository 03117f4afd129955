use std::time::Duration;

use either::{Either, Left};
use thiserror::Error;

use super::MetricLabel;
use crate::elements::RunKey;
use crate::SharedString;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The same commit and tool were already ingested. Retried deliveries land here.
    #[error("run {0} has already been recorded")]
    DuplicateRun(RunKey),

    #[error("run store is unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("run store write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("run log is corrupt at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("failed to encode run for the run log: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("unknown run log backend requested: {0}")]
    UnknownBackend(String),
}

impl StoreError {
    /// Durable backend failures the caller should retry with backoff.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::WriteTimeout(_))
    }
}

impl MetricLabel for StoreError {
    fn slug(&self) -> SharedString {
        "store".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::DuplicateRun(_) => Left("duplicate_run".into()),
            Self::Unavailable(_) | Self::WriteTimeout(_) => Left("unavailable".into()),
            Self::Corrupt { .. } => Left("corrupt".into()),
            Self::Encode(_) => Left("encode".into()),
            Self::UnknownBackend(_) => Left("settings".into()),
        }
    }
}
