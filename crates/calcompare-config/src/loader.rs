//! Configuration loading utilities

use crate::Config;
use calcompare_common::Result as CompareResult;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "CALCOMPARE_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Variable name
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for calcompare_common::CompareError {
    fn from(err: ConfigError) -> Self {
        calcompare_common::CompareError::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        Self::load_config_with(path, |name| env::var(name).ok())
    }

    /// Load a YAML file, apply overrides read through `lookup`, then validate
    pub fn load_config_with<P, F>(path: P, lookup: F) -> Result<Config, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::parse_file(path)?;
        Self::apply_overrides_with(&mut config, lookup)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Read and parse a YAML file without overrides or validation
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        info!(path = %path.as_ref().display(), "Loaded configuration file");
        Ok(config)
    }

    /// Apply command line overrides and validate the result again
    pub fn apply_cli_overrides(
        config: &mut Config,
        log_level: Option<String>,
        bind_address: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(level) = log_level {
            config.logging.level = level;
        }
        if let Some(bind) = bind_address {
            config.server.bind_address = bind;
        }
        config.validate_all()?;
        Ok(())
    }

    /// Load configuration from the usual locations, falling back to defaults
    pub fn load() -> CompareResult<Config> {
        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::load_config(&config_path)?
        } else if Path::new("config.yaml").exists() {
            Self::load_config("config.yaml")?
        } else if Path::new("config.yml").exists() {
            Self::load_config("config.yml")?
        } else {
            debug!("No configuration file found, using defaults");
            let mut config = Config::default();
            Self::apply_env_overrides(&mut config)?;
            config.validate_all().map_err(ConfigError::ValidationError)?;
            config
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CompareResult<Config> {
        Ok(Self::load_config(path)?)
    }

    /// Apply process environment overrides to `config`
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_with(config, |name| env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to its value
    pub fn apply_overrides_with<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("CALENDARIFIC_KEY") {
            config.providers.calendarific_api_key = if key.trim().is_empty() {
                None
            } else {
                Some(key)
            };
        }

        if let Some(url) = lookup("NAGER_BASE_URL") {
            config.providers.nager_base_url = url;
        }

        if let Some(url) = lookup("CALENDARIFIC_BASE_URL") {
            config.providers.calendarific_base_url = url;
        }

        if let Some(url) = lookup("WORLDTIME_BASE_URL") {
            config.providers.worldtime_base_url = url;
        }

        if let Some(bind) = lookup("CALCOMPARE_BIND") {
            config.server.bind_address = bind;
        }

        if let Some(level) = lookup("CALCOMPARE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(retries) = lookup("FETCH_MAX_RETRIES") {
            config.fetch.max_retries = parse_var("FETCH_MAX_RETRIES", &retries)?;
        }

        if let Some(timeout) = lookup("FETCH_TIMEOUT") {
            config.fetch.timeout_seconds = parse_var("FETCH_TIMEOUT", &timeout)?;
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
