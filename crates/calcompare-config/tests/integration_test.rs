//! Integration tests for calcompare-config

use calcompare_config::{ConfigError, ConfigLoader};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r"
server:
  bind_address: '127.0.0.1:8080'
  request_timeout_seconds: 60

providers:
  nager_base_url: 'https://date.nager.at/api/v3'
  calendarific_base_url: 'https://calendarific.com/api/v2'
  worldtime_base_url: 'https://worldtimeapi.org/api/timezone'

fetch:
  timeout_seconds: 5
  max_retries: 3
  backoff_base_ms: 500
  rate_limit_per_sec: 50

cache:
  holiday_ttl_hours: 12
  zone_status_ttl_minutes: 30

logging:
  level: 'debug'
  file: null
  json: true
  pretty: false
  include_targets: false
",
    );

    let config = ConfigLoader::load_config_with(file.path(), |_| None).expect("Failed to load config");
    assert_eq!(config.server.request_timeout_seconds, 60);
    assert_eq!(config.fetch.max_retries, 3);
    assert_eq!(config.fetch.backoff_base_ms, 500);
    assert_eq!(config.cache.holiday_ttl_hours, 12);
    assert!(config.logging.json);
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = write_config(
        r"
fetch:
  max_retries: 50
",
    );

    let err = ConfigLoader::load_config_with(file.path(), |_| None).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_malformed_yaml_is_a_parse_error() {
    let file = write_config("server: [unterminated");
    let err = ConfigLoader::load_config_with(file.path(), |_| None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = ConfigLoader::load_config_with("/definitely/not/here/config.yaml", |_| None).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn test_file_values_yield_to_overrides() {
    let file = write_config(
        r"
fetch:
  max_retries: 1
",
    );

    let parsed = ConfigLoader::parse_file(file.path()).expect("Failed to parse config");
    assert_eq!(parsed.fetch.max_retries, 1);

    let config = ConfigLoader::load_config_with(file.path(), |name| {
        (name == "FETCH_MAX_RETRIES").then(|| "4".to_string())
    })
    .expect("Failed to load config");
    assert_eq!(config.fetch.max_retries, 4);
}

#[test]
fn test_request_timeout_below_fetch_budget_is_rejected() {
    let file = write_config(
        r"
server:
  request_timeout_seconds: 30
",
    );

    let err = ConfigLoader::load_config_with(file.path(), |_| None).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}
