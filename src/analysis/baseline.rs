use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use strum_macros::{Display, EnumString};

use super::MIN_HISTORY;
use crate::elements::SeriesPoint;
use crate::error::AnalysisError;

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BaselineStatistic {
    Median,
    Mean,
}

impl Default for BaselineStatistic {
    fn default() -> Self {
        Self::Median
    }
}

/// Trailing reference value a new point is compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub statistic: BaselineStatistic,
    pub value: f64,
    pub std_dev: f64,
    pub size: usize,
    pub unit: String,
}

impl Baseline {
    pub fn compute(statistic: BaselineStatistic, window: &[SeriesPoint]) -> Result<Self, AnalysisError> {
        if window.len() < MIN_HISTORY {
            return Err(AnalysisError::InsufficientHistory { supplied: window.len(), need: MIN_HISTORY });
        }

        let values: Vec<f64> = window.iter().map(|p| p.value).collect();
        let value = match statistic {
            BaselineStatistic::Median => Data::new(values.clone()).median(),
            BaselineStatistic::Mean => values.iter().mean(),
        };

        Ok(Self {
            statistic,
            value,
            std_dev: values.iter().std_dev(),
            size: values.len(),
            unit: window[window.len() - 1].unit.clone(),
        })
    }
}
