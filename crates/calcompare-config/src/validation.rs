//! Custom validators used by the configuration structures

use std::net::SocketAddr;
use validator::ValidationError;

/// Validate a log level name
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Validate a listener address such as `0.0.0.0:8000` or `[::1]:8080`
pub fn validate_bind_address(address: &str) -> Result<(), ValidationError> {
    address
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_bind_address"))
}

/// Validate file path (basic check for valid path characters)
pub fn validate_file_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::new("empty_file_path"));
    }

    // Colon is allowed for Windows drive letters (C:\)
    let invalid_chars = ['<', '>', '"', '|', '?', '*'];
    if path.chars().any(|c| invalid_chars.contains(&c)) {
        return Err(ValidationError::new("invalid_file_path_characters"));
    }

    Ok(())
}
