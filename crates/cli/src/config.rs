//! Configuration management for the CLI

use anyhow::{Context, Result};
use gather_lib::GatherConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Log record format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// CLI settings, from an optional file overlaid with `K8S_GATHER_*` variables
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Seconds after turning ready during which resource samples are distrusted
    #[serde(default = "default_cpu_initialization_period")]
    pub cpu_initialization_period_secs: u64,

    /// Seconds after creation during which a never-ready pod is left out
    #[serde(default = "default_initial_readiness_delay")]
    pub initial_readiness_delay_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Namespace used when neither the flag nor the snapshot names one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
}

fn default_cpu_initialization_period() -> u64 {
    300
}

fn default_initial_readiness_delay() -> u64 {
    30
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cpu_initialization_period_secs: default_cpu_initialization_period(),
            initial_readiness_delay_secs: default_initial_readiness_delay(),
            log_format: LogFormat::default(),
            default_namespace: default_namespace(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("K8S_GATHER").try_parsing(true))
            .build()
            .context("Failed to load configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn gather_config(&self) -> GatherConfig {
        GatherConfig {
            cpu_initialization_period: Duration::from_secs(self.cpu_initialization_period_secs),
            initial_readiness_delay: Duration::from_secs(self.initial_readiness_delay_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_library() {
        let settings = Settings::default();
        let config = settings.gather_config();
        let library = GatherConfig::default();

        assert_eq!(config.cpu_initialization_period, library.cpu_initialization_period);
        assert_eq!(config.initial_readiness_delay, library.initial_readiness_delay);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.default_namespace, "default");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"cpu_initialization_period_secs": 120, "log_format": "text", "default_namespace": "shop"}}"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();

        assert_eq!(settings.cpu_initialization_period_secs, 120);
        assert_eq!(settings.initial_readiness_delay_secs, 30);
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(settings.default_namespace, "shop");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/k8s-gather.json")));
        assert!(result.is_err());
    }
}
