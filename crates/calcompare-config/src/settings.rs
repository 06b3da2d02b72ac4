//! Application configuration structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    #[validate]
    pub server: ServerConfig,

    /// Upstream provider endpoints and credentials
    #[validate]
    pub providers: ProvidersConfig,

    /// Outbound request policy
    #[validate]
    pub fetch: FetchConfig,

    /// Cache lifetimes
    #[validate]
    pub cache: CacheConfig,

    /// Logging configuration
    #[validate]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. "0.0.0.0:8000"
    #[validate(custom(
        function = "crate::validation::validate_bind_address",
        message = "Bind address must be a socket address like 0.0.0.0:8000"
    ))]
    pub bind_address: String,

    /// Upper bound on handling one API request, in seconds
    #[validate(range(min = 1, max = 300, message = "Request timeout must be between 1 and 300 seconds"))]
    pub request_timeout_seconds: u64,
}

/// Upstream data providers
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Nager.Date v3 API root
    #[validate(url(message = "Nager.Date base URL must be a valid URL"))]
    pub nager_base_url: String,

    /// Calendarific v2 API root
    #[validate(url(message = "Calendarific base URL must be a valid URL"))]
    pub calendarific_base_url: String,

    /// Calendarific API key; the secondary holiday provider is disabled without it
    pub calendarific_api_key: Option<String>,

    /// WorldTimeAPI timezone endpoint root
    #[validate(url(message = "WorldTimeAPI base URL must be a valid URL"))]
    pub worldtime_base_url: String,
}

/// Outbound request policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt timeout in seconds
    #[validate(range(min = 1, max = 120, message = "Timeout must be between 1 and 120 seconds"))]
    pub timeout_seconds: u64,

    /// Retries after the first attempt
    #[validate(range(max = 10, message = "Max retries cannot exceed 10"))]
    pub max_retries: u32,

    /// Linear backoff unit in milliseconds
    #[validate(range(max = 60000, message = "Backoff base cannot exceed 60000 ms"))]
    pub backoff_base_ms: u64,

    /// Outbound requests per second across all providers
    #[validate(range(min = 1, max = 1000, message = "Rate limit must be between 1 and 1000"))]
    pub rate_limit_per_sec: u32,
}

/// Cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Holiday list lifetime in hours
    #[validate(range(min = 1, max = 720, message = "Holiday TTL must be between 1 and 720 hours"))]
    pub holiday_ttl_hours: u64,

    /// Zone status lifetime in minutes
    #[validate(range(min = 1, max = 1440, message = "Zone status TTL must be between 1 and 1440 minutes"))]
    pub zone_status_ttl_minutes: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(custom(
        function = "crate::validation::validate_log_level",
        message = "Log level must be one of: trace, debug, info, warn, error"
    ))]
    pub level: String,

    /// Optional log file path
    #[validate(custom(function = "crate::validation::validate_file_path"))]
    pub file: Option<String>,

    /// Emit JSON lines
    pub json: bool,

    /// Multi-line human readable output
    pub pretty: bool,

    /// Include module targets in output
    pub include_targets: bool,
}

impl Config {
    /// Field validation plus cross-field checks
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.providers.validate_credentials()?;
        self.validate_request_budget()?;
        Ok(())
    }

    /// Longest a comparison can wait on upstreams.
    ///
    /// Zone lookups run alongside the holiday lookups, which may fall through
    /// from Nager to Calendarific one after the other.
    pub fn comparison_budget(&self) -> Duration {
        let phases = if self.providers.calendarific_key().is_some() { 2 } else { 1 };
        self.fetch
            .to_fetcher_config()
            .worst_case_latency()
            .saturating_mul(phases)
    }

    // A request timeout shorter than the upstream budget would cut off
    // comparisons that are still degrading gracefully.
    fn validate_request_budget(&self) -> Result<(), validator::ValidationErrors> {
        if self.server.request_timeout() > self.comparison_budget() {
            return Ok(());
        }

        let mut error = validator::ValidationError::new("request_timeout_below_fetch_budget");
        error.message = Some(
            format!(
                "Request timeout must exceed the worst-case upstream time of {}s",
                self.comparison_budget().as_secs()
            )
            .into(),
        );
        let mut errors = validator::ValidationErrors::new();
        errors.add("request_timeout_seconds", error);
        Err(errors)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            request_timeout_seconds: 90,
        }
    }
}

impl ServerConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            nager_base_url: "https://date.nager.at/api/v3".to_string(),
            calendarific_base_url: "https://calendarific.com/api/v2".to_string(),
            calendarific_api_key: None,
            worldtime_base_url: "https://worldtimeapi.org/api/timezone".to_string(),
        }
    }
}

impl ProvidersConfig {
    /// The Calendarific key, if one is configured and non-blank
    pub fn calendarific_key(&self) -> Option<&str> {
        self.calendarific_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    fn validate_credentials(&self) -> Result<(), validator::ValidationErrors> {
        let mut errors = validator::ValidationErrors::new();

        if let Some(key) = &self.calendarific_api_key {
            if key.trim().is_empty() {
                errors.add(
                    "calendarific_api_key",
                    validator::ValidationError::new("blank_api_key"),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("nager_base_url", &self.nager_base_url)
            .field("calendarific_base_url", &self.calendarific_base_url)
            .field(
                "calendarific_api_key",
                &self.calendarific_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("worldtime_base_url", &self.worldtime_base_url)
            .finish()
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_retries: 2,
            backoff_base_ms: 1000,
            rate_limit_per_sec: 20,
        }
    }
}

impl FetchConfig {
    /// Fetcher settings for the common crate
    pub fn to_fetcher_config(&self) -> calcompare_common::FetcherConfig {
        calcompare_common::FetcherConfig::default()
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_max_retries(self.max_retries)
            .with_backoff_base(Duration::from_millis(self.backoff_base_ms))
            .with_rate_limit(self.rate_limit_per_sec)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            holiday_ttl_hours: 24,
            zone_status_ttl_minutes: 60,
        }
    }
}

impl CacheConfig {
    /// Holiday list lifetime
    pub fn holiday_ttl(&self) -> Duration {
        Duration::from_secs(self.holiday_ttl_hours * 3600)
    }

    /// Zone status lifetime
    pub fn zone_status_ttl(&self) -> Duration {
        Duration::from_secs(self.zone_status_ttl_minutes * 60)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
            pretty: false,
            include_targets: true,
        }
    }
}

impl LoggingConfig {
    /// Subscriber settings for the common crate
    pub fn to_logging_config(&self) -> calcompare_common::LoggingConfig {
        calcompare_common::LoggingConfig {
            level: self.level.clone(),
            json_format: self.json,
            pretty_format: self.pretty,
            file_path: self.file.clone(),
            include_spans: false,
            include_targets: self.include_targets,
        }
    }
}
