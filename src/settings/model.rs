use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisSettings;
use crate::query::ExportSettings;
use crate::store::StoreSettings;
use crate::validation::ValidationPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub validation: ValidationPolicy,
    pub analysis: AnalysisSettings,
    pub export: ExportSettings,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use claim::*;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analysis::BaselineStatistic;
    use crate::elements::{Polarity, PolarityCatalog, PolarityRule};
    use crate::store::RunLogType;

    #[test]
    fn test_settings_yaml_deser() {
        let rep = r##"
store:
  backend: file
  path: ./var/benchwatch
  write_timeout_millis: 2500
validation:
  known_tools: [ googlecpp, benchmarkdotnet ]
analysis:
  window: 7
  threshold: 1.15
  fail_threshold: 1.5
  statistic: mean
  polarity:
    rules:
      - tool: googlecpp
        benchmark: "*"
        polarity: lower_is_better
      - benchmark: "throughput/*"
        polarity: higher_is_better
export:
  repo_url: https://github.com/VowpalWabbit/vowpal_wabbit
  max_items: 100
"##;

        let actual: Settings = assert_ok!(serde_yaml::from_str(rep));
        assert_eq!(
            actual,
            Settings {
                store: StoreSettings {
                    backend: RunLogType::File,
                    path: Some(PathBuf::from("./var/benchwatch")),
                    write_timeout: Duration::from_millis(2500),
                },
                validation: ValidationPolicy::with_known_tools(["googlecpp", "benchmarkdotnet"]),
                analysis: AnalysisSettings {
                    window: 7,
                    threshold: 1.15,
                    fail_threshold: Some(1.5),
                    statistic: BaselineStatistic::Mean,
                    polarity: PolarityCatalog::new(vec![
                        PolarityRule::new(Some("googlecpp"), "*", Polarity::LowerIsBetter),
                        PolarityRule::new(None, "throughput/*", Polarity::HigherIsBetter),
                    ]),
                },
                export: ExportSettings {
                    repo_url: "https://github.com/VowpalWabbit/vowpal_wabbit".to_string(),
                    max_items: Some(100),
                    ..ExportSettings::default()
                },
            }
        );
    }

    #[test]
    fn test_settings_defaults_when_empty() {
        let actual: Settings = assert_ok!(serde_yaml::from_str("analysis:\n  window: 3\n"));
        assert_eq!(actual.store, StoreSettings::default());
        assert_eq!(actual.analysis.window, 3);
        assert_eq!(actual.analysis.threshold, 1.1);
        assert_eq!(actual.analysis.statistic, BaselineStatistic::Median);
        assert!(actual.validation.known_tools.is_empty());
        assert_eq!(actual.export.group, "Benchmark");
    }
}
