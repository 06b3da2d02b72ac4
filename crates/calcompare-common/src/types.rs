//! Records exchanged between providers, the comparison engine and the API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single public holiday occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    /// Calendar date, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    /// English label
    pub name: String,
    /// Label in the country's language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// ISO-3166 alpha-2 code of the observing country
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl Holiday {
    /// Create a holiday with only the English label
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            local_name: None,
            country_code: None,
        }
    }

    /// Set the local-language label
    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    /// Set the observing country
    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    /// Local label when present and non-empty, otherwise the English one
    pub fn display_name(&self) -> &str {
        match self.local_name.as_deref() {
            Some(local) if !local.trim().is_empty() => local,
            _ => &self.name,
        }
    }
}

/// Upstream that supplied a holiday list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolidaySource {
    /// Primary provider
    #[serde(rename = "Nager.Date")]
    NagerDate,
    /// Secondary provider, used only when the primary yields nothing
    #[serde(rename = "Calendarific")]
    Calendarific,
}

impl fmt::Display for HolidaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolidaySource::NagerDate => write!(f, "Nager.Date"),
            HolidaySource::Calendarific => write!(f, "Calendarific"),
        }
    }
}

/// Snapshot of one IANA zone's offset at fetch time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStatus {
    /// IANA identifier, e.g. `America/New_York`
    pub zone: String,
    /// Current offset as `±HH:MM`
    pub utc_offset: String,
    /// Whether daylight saving is in effect; always false from local computation
    pub dst: bool,
}

/// Holiday both countries observe on the same date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonHoliday {
    /// Shared date
    pub date: NaiveDate,
    /// Country A's name for the day
    pub name_a: String,
    /// Country B's name for the day
    pub name_b: String,
}

/// Partition of two holiday calendars by date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayComparison {
    /// Dates present on both sides
    pub common: Vec<CommonHoliday>,
    /// Dates only country A observes
    pub only_a: Vec<Holiday>,
    /// Dates only country B observes
    pub only_b: Vec<Holiday>,
}

/// Zones of both countries currently sharing one offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetOverlap {
    /// Shared `±HH:MM` offset
    pub offset: String,
    /// Country A's zones at this offset
    pub zones_a: Vec<String>,
    /// Country B's zones at this offset
    pub zones_b: Vec<String>,
}

/// Offsets shared right now by both countries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetOverlapReport {
    /// True iff `overlaps` is non-empty
    pub has_overlap: bool,
    /// One entry per shared offset, ordered by offset
    pub overlaps: Vec<OffsetOverlap>,
}

impl OffsetOverlapReport {
    /// Build a report, deriving `has_overlap` from the overlaps
    pub fn new(overlaps: Vec<OffsetOverlap>) -> Self {
        Self {
            has_overlap: !overlaps.is_empty(),
            overlaps,
        }
    }
}

/// Current zone statuses of both countries and their overlaps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneComparison {
    /// Resolved statuses of country A's zones
    #[serde(rename = "A")]
    pub a: Vec<ZoneStatus>,
    /// Resolved statuses of country B's zones
    #[serde(rename = "B")]
    pub b: Vec<ZoneStatus>,
    /// Offsets shared right now
    #[serde(rename = "commonOffsetNow")]
    pub common_offset_now: OffsetOverlapReport,
}

/// Echo of the comparison request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonInputs {
    /// First country, ISO-2
    pub country_a: String,
    /// Second country, ISO-2
    pub country_b: String,
    /// Compared year
    pub year: i32,
}

/// Full output of a two-country comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Request echo
    pub inputs: ComparisonInputs,
    /// Holiday partition
    pub holidays: HolidayComparison,
    /// Timezone report
    pub timezones: TimezoneComparison,
}
