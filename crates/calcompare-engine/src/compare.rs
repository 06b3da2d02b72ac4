//! Two-country holiday and timezone comparison
//!
//! The I/O half ([`ComparisonEngine::compare`]) fans out to the providers and
//! joins the results. The set logic lives in the pure functions
//! [`partition_holidays`], [`group_by_offset`] and [`find_overlaps`].

use calcompare_common::{
    CommonHoliday, ComparisonInputs, ComparisonResult, Holiday, HolidayComparison, OffsetOverlap,
    OffsetOverlapReport, TimezoneComparison, ZoneStatus,
};
use chrono::NaiveDate;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::catalog::ZoneDirectory;
use crate::holidays::HolidayProvider;
use crate::zone_status::ZoneStatusProvider;

/// Offset string → zones currently at that offset, in input order
pub type OffsetGroups = BTreeMap<String, Vec<String>>;

/// Orchestrates the providers to compare two countries
#[derive(Clone)]
pub struct ComparisonEngine {
    holidays: Arc<HolidayProvider>,
    zones: Arc<ZoneStatusProvider>,
    directory: Arc<dyn ZoneDirectory>,
}

impl ComparisonEngine {
    /// Create an engine over shared providers
    pub fn new(
        holidays: Arc<HolidayProvider>,
        zones: Arc<ZoneStatusProvider>,
        directory: Arc<dyn ZoneDirectory>,
    ) -> Self {
        Self {
            holidays,
            zones,
            directory,
        }
    }

    /// Holiday provider
    pub fn holiday_provider(&self) -> &HolidayProvider {
        &self.holidays
    }

    /// Zone status provider
    pub fn zone_provider(&self) -> &ZoneStatusProvider {
        &self.zones
    }

    /// Country → zones lookup
    pub fn directory(&self) -> &dyn ZoneDirectory {
        self.directory.as_ref()
    }

    /// Compare holidays in `year` and current offsets of two countries.
    ///
    /// Upstream failures degrade to empty holiday lists and missing zone
    /// statuses; this never fails.
    #[instrument(skip(self))]
    pub async fn compare(&self, country_a: &str, country_b: &str, year: i32) -> ComparisonResult {
        let country_a = country_a.trim().to_ascii_uppercase();
        let country_b = country_b.trim().to_ascii_uppercase();

        let (holidays_a, holidays_b, statuses_a, statuses_b) = futures::join!(
            self.holidays.get_holidays(&country_a, year),
            self.holidays.get_holidays(&country_b, year),
            self.zone_statuses(&country_a),
            self.zone_statuses(&country_b)
        );

        let holidays = partition_holidays(&holidays_a, &holidays_b);
        let common_offset_now =
            find_overlaps(&group_by_offset(&statuses_a), &group_by_offset(&statuses_b));

        info!(
            country_a = %country_a,
            country_b = %country_b,
            year,
            common = holidays.common.len(),
            only_a = holidays.only_a.len(),
            only_b = holidays.only_b.len(),
            overlaps = common_offset_now.overlaps.len(),
            "comparison complete"
        );

        ComparisonResult {
            inputs: ComparisonInputs {
                country_a,
                country_b,
                year,
            },
            holidays,
            timezones: TimezoneComparison {
                a: statuses_a,
                b: statuses_b,
                common_offset_now,
            },
        }
    }

    /// Resolved statuses of every zone of `iso2`; unresolvable zones are dropped
    pub async fn zone_statuses(&self, iso2: &str) -> Vec<ZoneStatus> {
        let zones = self.directory.zones_for(iso2);
        join_all(zones.iter().map(|zone| self.zones.get_zone_status(zone)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

impl std::fmt::Debug for ComparisonEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonEngine")
            .field("holidays", &self.holidays)
            .field("zones", &self.zones)
            .field("directory", &"<dyn ZoneDirectory>")
            .finish()
    }
}

/// Partition two holiday lists by date.
///
/// Within one list a later holiday replaces an earlier one on the same date.
/// All three buckets are ordered by date.
pub fn partition_holidays(a: &[Holiday], b: &[Holiday]) -> HolidayComparison {
    let by_date_a = index_by_date(a);
    let by_date_b = index_by_date(b);

    let mut comparison = HolidayComparison::default();

    for (date, holiday_a) in &by_date_a {
        match by_date_b.get(date) {
            Some(holiday_b) => comparison.common.push(CommonHoliday {
                date: *date,
                name_a: holiday_a.display_name().to_string(),
                name_b: holiday_b.display_name().to_string(),
            }),
            None => comparison.only_a.push((*holiday_a).clone()),
        }
    }

    comparison.only_b = by_date_b
        .iter()
        .filter(|(date, _)| !by_date_a.contains_key(*date))
        .map(|(_, holiday)| (*holiday).clone())
        .collect();

    comparison
}

fn index_by_date(holidays: &[Holiday]) -> BTreeMap<NaiveDate, &Holiday> {
    holidays.iter().map(|holiday| (holiday.date, holiday)).collect()
}

/// Group zone names by their current offset
pub fn group_by_offset(statuses: &[ZoneStatus]) -> OffsetGroups {
    let mut groups = OffsetGroups::new();
    for status in statuses {
        groups
            .entry(status.utc_offset.clone())
            .or_default()
            .push(status.zone.clone());
    }
    groups
}

/// Offsets present on both sides, ordered by offset string
pub fn find_overlaps(a: &OffsetGroups, b: &OffsetGroups) -> OffsetOverlapReport {
    let overlaps = a
        .iter()
        .filter_map(|(offset, zones_a)| {
            b.get(offset).map(|zones_b| OffsetOverlap {
                offset: offset.clone(),
                zones_a: zones_a.clone(),
                zones_b: zones_b.clone(),
            })
        })
        .collect();

    OffsetOverlapReport::new(overlaps)
}
