//! Error types and utilities for calcompare

use thiserror::Error;

use crate::fetch::FetchError;

/// Result type alias for calcompare operations
pub type Result<T> = std::result::Result<T, CompareError>;

/// Main error type for calcompare operations
#[derive(Error, Debug)]
pub enum CompareError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP client setup, sockets)
    #[error("Network error: {message}")]
    Network {
        /// Human readable description
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An upstream data provider failed after all retries
    #[error("Upstream error: {message}")]
    Upstream {
        /// Human readable description
        message: String,
        /// HTTP status of the last attempt, when there was one
        status_code: Option<u16>,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
        /// Offending input field
        field: Option<String>,
    },

    /// Unknown or unusable IANA zone
    #[error("Timezone error: {message}")]
    Timezone {
        /// Human readable description
        message: String,
        /// Zone identifier that was rejected
        zone: Option<String>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Human readable description
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CompareError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new upstream error with the last HTTP status observed
    pub fn upstream_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Upstream {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new timezone error for the given zone
    pub fn timezone(msg: impl Into<String>, zone: impl Into<String>) -> Self {
        Self::Timezone {
            message: msg.into(),
            zone: Some(zone.into()),
        }
    }

    /// Whether this error was caused by bad caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Convert from FetchError to CompareError
impl From<FetchError> for CompareError {
    fn from(err: FetchError) -> Self {
        let status_code = err.status();
        Self::Upstream {
            message: err.to_string(),
            status_code,
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from reqwest::Error to CompareError
impl From<reqwest::Error> for CompareError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_builder() {
            Self::network_with_source("Failed to build HTTP client", err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}
