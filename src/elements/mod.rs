mod alert;
mod commit;
mod point;
mod polarity;
mod run;
mod series;
pub mod timestamp;

pub use alert::{Alert, Severity};
pub use commit::{Author, Commit};
pub use point::{BenchmarkPoint, SecondaryStats};
pub use polarity::{Polarity, PolarityCatalog, PolarityRule};
pub use run::{Run, RunKey};
pub use series::{Series, SeriesKey, SeriesPoint, SeriesWindow, UnitChange};
pub use timestamp::Timestamp;
