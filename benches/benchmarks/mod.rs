pub mod analysis;
pub mod ingest;
