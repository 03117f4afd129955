use prometheus::Registry;

use crate::error::BenchwatchError;
use crate::{ingest, store};

#[tracing::instrument(level = "info", skip(registry))]
pub fn register_benchwatch_metrics(registry: &Registry) -> Result<(), BenchwatchError> {
    registry.register(Box::new(store::STORE_APPEND_TIME.clone()))?;
    registry.register(Box::new(ingest::RUNS_INGESTED.clone()))?;
    registry.register(Box::new(ingest::DUPLICATE_RUNS.clone()))?;
    registry.register(Box::new(ingest::RUNS_REJECTED.clone()))?;
    registry.register(Box::new(ingest::ALERTS_RAISED.clone()))?;
    Ok(())
}
