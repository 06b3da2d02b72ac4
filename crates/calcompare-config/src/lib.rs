//! Configuration management for calcompare

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader};
pub use settings::{CacheConfig, Config, FetchConfig, LoggingConfig, ProvidersConfig, ServerConfig};
