pub use model::*;

mod model;

use std::convert::{TryFrom, TryInto};
use std::path::{Path, PathBuf};

use crate::error::SettingsError;

pub const RESOURCES_DIR: &str = "resources";
pub const APPLICATION_CONFIG: &str = "application";

/// Loads settings, later sources overriding earlier ones:
/// 1. `resources/application.yaml`, when present
/// 2. `resources/<APP_ENVIRONMENT>.yaml`, when `APP_ENVIRONMENT` is set and the file is present
/// 3. the explicitly named configuration file, which must exist
/// 4. environment variables prefixed with `APP__`, with `__` separating nested keys, e.g.
///    `APP__ANALYSIS__THRESHOLD=1.2` sets `Settings.analysis.threshold`.
#[tracing::instrument(level = "info")]
pub fn load_settings(config_path: Option<&Path>) -> Result<Settings, SettingsError> {
    let resources = PathBuf::from(RESOURCES_DIR);
    let mut builder = config::Config::builder()
        .add_source(config::File::from(resources.join(APPLICATION_CONFIG)).required(false));

    if let Ok(environment) = std::env::var("APP_ENVIRONMENT") {
        let environment: Environment = environment.try_into()?;
        tracing::info!(?environment, "loading environment settings overrides.");
        builder = builder.add_source(config::File::from(resources.join(environment.as_ref())).required(false));
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config = builder
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    tracing::debug!(?settings, "settings loaded.");
    Ok(settings)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl AsRef<str> for Environment {
    fn as_ref(&self) -> &str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = SettingsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(SettingsError::Environment(format!("do not recognize {} environment.", other))),
        }
    }
}
