//! Structured logging infrastructure for calcompare

use std::{fs::OpenOptions, io, sync::Arc};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{CompareError, Result};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "calcompare_engine=trace")
    pub level: String,
    /// Emit one JSON object per event
    pub json_format: bool,
    /// Multi-line human-friendly output
    pub pretty_format: bool,
    /// Optional file path for log output instead of stdout
    pub file_path: Option<String>,
    /// Whether to log span open/close events
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_format: false,
            file_path: None,
            include_spans: false,
            include_targets: true,
        }
    }
}

/// Install the global tracing subscriber described by `config`.
///
/// Fails if a subscriber is already installed or the log file cannot be opened.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| CompareError::config_with_source("Invalid log filter", e))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, ansi) = match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stdout), true),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_writer(writer),
            )
            .try_init()
    } else if config.pretty_format {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(ansi)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_ids(true)
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(ansi)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_writer(writer),
            )
            .try_init()
    };

    installed.map_err(|e| CompareError::config_with_source("Failed to install tracing subscriber", e))
}

/// Initialize logging with default configuration
pub fn init_default_logging() -> Result<()> {
    init_logging(&LoggingConfig::default())
}
