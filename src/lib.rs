pub mod analysis;
pub mod elements;
pub mod error;
pub mod ingest;
pub mod legacy;
pub mod metrics;
pub mod query;
pub mod serde;
pub mod settings;
pub mod store;
pub mod tracing;
pub mod validation;

pub use analysis::{AnalysisSettings, RegressionAnalyzer};
pub use error::BenchwatchError;
pub use ingest::{IngestReceipt, Ingestor};
pub use query::QueryService;
pub use settings::Settings;
pub use store::SeriesStore;

pub type SharedString = std::borrow::Cow<'static, str>;

pub type BenchwatchResult<T> = Result<T, error::BenchwatchError>;
