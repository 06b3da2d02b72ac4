//! Offset formatting and input validation helpers.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CompareError, Result};

/// Earliest year accepted by the API
pub const MIN_YEAR: i32 = 2000;

/// Latest year accepted by the API
pub const MAX_YEAR: i32 = 2100;

/// Longest IANA zone identifier accepted by the API
pub const MAX_ZONE_LEN: usize = 64;

static UTC_OFFSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]\d{2}:\d{2}$").expect("Invalid UTC offset regex pattern"));

static ZONE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_+\-]+(/[A-Za-z0-9_+\-]+)*$").expect("Invalid zone id regex pattern")
});

/// Format an offset in seconds east of UTC as `±HH:MM`.
///
/// Zero is rendered with a plus sign; seconds below a minute are truncated.
pub fn format_utc_offset(offset_seconds: i32) -> String {
    let sign = if offset_seconds >= 0 { '+' } else { '-' };
    let abs = offset_seconds.unsigned_abs();
    let hours = abs / 3600;
    let minutes = (abs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

/// Whether `offset` has the exact `±HH:MM` shape
pub fn is_valid_utc_offset(offset: &str) -> bool {
    UTC_OFFSET_REGEX.is_match(offset)
}

/// Validate an ISO-3166 alpha-2 code and return it upper-cased
pub fn normalize_country_code(code: &str, field: &str) -> Result<String> {
    let trimmed = code.trim();
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CompareError::validation_field(
            format!("'{code}' is not an ISO-3166 alpha-2 country code"),
            field,
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Validate that `year` lies in the supported range
pub fn validate_year(year: i32) -> Result<i32> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(CompareError::validation_field(
            format!("year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"),
            "year",
        ))
    }
}

/// Validate the shape of an IANA zone identifier
pub fn validate_zone_id(zone: &str) -> Result<()> {
    if zone.is_empty() || zone.len() > MAX_ZONE_LEN || !ZONE_ID_REGEX.is_match(zone) {
        return Err(CompareError::validation_field(
            format!("'{zone}' is not a valid IANA zone identifier"),
            "zone",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_utc_offset() {
        assert_eq!(format_utc_offset(0), "+00:00");
        assert_eq!(format_utc_offset(-5 * 3600), "-05:00");
        assert_eq!(format_utc_offset(5 * 3600 + 30 * 60), "+05:30");
        assert_eq!(format_utc_offset(5 * 3600 + 45 * 60), "+05:45");
        assert_eq!(format_utc_offset(-(9 * 3600 + 30 * 60)), "-09:30");
        assert_eq!(format_utc_offset(14 * 3600), "+14:00");
    }

    #[test]
    fn test_is_valid_utc_offset() {
        assert!(is_valid_utc_offset("+00:00"));
        assert!(is_valid_utc_offset("-07:00"));
        assert!(!is_valid_utc_offset("07:00"));
        assert!(!is_valid_utc_offset("+7:00"));
        assert!(!is_valid_utc_offset("+0700"));
        assert!(!is_valid_utc_offset(""));
        assert!(!is_valid_utc_offset("N/A"));
    }

    #[test]
    fn test_normalize_country_code() {
        assert_eq!(normalize_country_code("us", "country").unwrap(), "US");
        assert_eq!(normalize_country_code(" co ", "country").unwrap(), "CO");

        for bad in ["", "U", "USA", "1A", "é1"] {
            let err = normalize_country_code(bad, "countryA").unwrap_err();
            assert!(err.is_validation(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year(2000).is_ok());
        assert!(validate_year(2025).is_ok());
        assert!(validate_year(2100).is_ok());
        assert!(validate_year(1999).is_err());
        assert!(validate_year(2101).is_err());
    }

    #[test]
    fn test_validate_zone_id() {
        for zone in [
            "America/New_York",
            "America/Argentina/Buenos_Aires",
            "Etc/GMT+5",
            "UTC",
            "America/Port-au-Prince",
        ] {
            assert!(validate_zone_id(zone).is_ok(), "{zone} should be accepted");
        }

        for zone in ["", "/America", "America/", "../etc/passwd", "America/New York", "a?b=c"] {
            assert!(validate_zone_id(zone).is_err(), "{zone:?} should be rejected");
        }
        assert!(validate_zone_id(&"A".repeat(MAX_ZONE_LEN + 1)).is_err());
    }

    proptest! {
        #[test]
        fn formatted_offsets_are_always_well_formed(seconds in -14 * 3600..=14 * 3600i32) {
            prop_assert!(is_valid_utc_offset(&format_utc_offset(seconds)));
        }
    }
}
