use either::{Either, Left};
use thiserror::Error;

use super::MetricLabel;
use crate::SharedString;

/// Error variants related to configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    /// Error working with environment variable
    #[error("{0}")]
    Environment(String),

    /// Error in configuration settings.
    #[error(transparent)]
    Configuration(#[from] config::ConfigError),
}

impl MetricLabel for SettingsError {
    fn slug(&self) -> SharedString {
        "settings".into()
    }

    fn next(&self) -> Either<SharedString, Box<&dyn MetricLabel>> {
        match self {
            Self::Environment(_) => Left("environment".into()),
            Self::Configuration(_) => Left("configuration".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_settings_error_labels() {
        let err = SettingsError::Environment("APP_ENVIRONMENT".to_string());
        assert_eq!(err.label(), "settings::environment");

        let err: SettingsError = config::ConfigError::Message("missing store path".to_string()).into();
        assert_eq!(err.label(), "settings::configuration");
    }
}
