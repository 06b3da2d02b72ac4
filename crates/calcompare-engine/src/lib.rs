//! # calcompare engine
//!
//! Holiday and zone-status providers, the static country catalog and the
//! comparison engine that joins them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod compare;
pub mod holidays;
pub mod zone_status;

pub use catalog::{countries, find_country, Country, StaticZoneDirectory, ZoneDirectory};
pub use compare::{find_overlaps, group_by_offset, partition_holidays, ComparisonEngine, OffsetGroups};
pub use holidays::{HolidayLookup, HolidayProvider, HolidayProviderConfig};
pub use zone_status::{local_zone_status, ZoneStatusProvider};
