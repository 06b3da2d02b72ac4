//! Static reference data: the country catalog and the country → zone table
//!
//! Both tables are compiled into the binary. The country list is parsed once
//! on first access.

mod zones;

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use zones::COUNTRY_ZONES;

const COUNTRIES_JSON: &str = include_str!("../../data/countries_un195.json");

static COUNTRIES: LazyLock<Vec<Country>> = LazyLock::new(|| {
    serde_json::from_str(COUNTRIES_JSON).expect("embedded country catalog must be valid JSON")
});

/// A sovereign state in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Spanish display name
    pub name_es: String,
    /// English display name
    pub name_en: String,
    /// ISO-3166 alpha-2 code
    pub iso2: String,
    /// ISO-3166 alpha-3 code
    pub iso3: String,
}

/// The 193 UN member states plus the two observer states
pub fn countries() -> &'static [Country] {
    &COUNTRIES
}

/// Look up a country by alpha-2 code, ignoring case
pub fn find_country(iso2: &str) -> Option<&'static Country> {
    countries()
        .iter()
        .find(|country| country.iso2.eq_ignore_ascii_case(iso2.trim()))
}

/// Resolves the IANA zones a country observes
pub trait ZoneDirectory: Send + Sync {
    /// Zones for `iso2`; empty when the code is unknown
    fn zones_for(&self, iso2: &str) -> Vec<String>;
}

/// [`ZoneDirectory`] backed by the embedded zone table
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticZoneDirectory;

impl ZoneDirectory for StaticZoneDirectory {
    fn zones_for(&self, iso2: &str) -> Vec<String> {
        let code = iso2.trim().to_ascii_uppercase();
        COUNTRY_ZONES
            .binary_search_by(|(cc, _)| (*cc).cmp(code.as_str()))
            .map(|idx| COUNTRY_ZONES[idx].1.iter().map(|zone| (*zone).to_string()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_195_unique_countries() {
        let all = countries();
        assert_eq!(all.len(), 195);

        let iso2: HashSet<_> = all.iter().map(|c| c.iso2.as_str()).collect();
        let iso3: HashSet<_> = all.iter().map(|c| c.iso3.as_str()).collect();
        assert_eq!(iso2.len(), 195);
        assert_eq!(iso3.len(), 195);
        assert!(all.iter().all(|c| c.iso2.len() == 2 && c.iso3.len() == 3));
    }

    #[test]
    fn test_single_eswatini_entry() {
        let sz: Vec<_> = countries().iter().filter(|c| c.iso2 == "SZ").collect();
        assert_eq!(sz.len(), 1);
        assert_eq!(sz[0].name_en, "Eswatini");
    }

    #[test]
    fn test_find_country() {
        let colombia = find_country("co").unwrap();
        assert_eq!(colombia.name_es, "Colombia");
        assert_eq!(colombia.iso3, "COL");
        assert!(find_country("XX").is_none());
    }

    #[test]
    fn test_zone_table_is_sorted_and_covers_catalog() {
        assert!(COUNTRY_ZONES.windows(2).all(|w| w[0].0 < w[1].0));
        for country in countries() {
            assert!(
                !StaticZoneDirectory.zones_for(&country.iso2).is_empty(),
                "{} has no zones",
                country.iso2
            );
        }
    }

    #[test]
    fn test_zones_for_known_countries() {
        let us = StaticZoneDirectory.zones_for("US");
        assert_eq!(us.len(), 29);
        assert_eq!(us.first().map(String::as_str), Some("America/New_York"));
        assert_eq!(us.last().map(String::as_str), Some("Pacific/Honolulu"));

        assert_eq!(StaticZoneDirectory.zones_for("co"), vec!["America/Bogota"]);
        assert!(StaticZoneDirectory.zones_for("XX").is_empty());
    }

    #[test]
    fn test_table_zones_parse_as_iana_ids() {
        for (cc, zones) in COUNTRY_ZONES {
            for zone in *zones {
                assert!(zone.parse::<Tz>().is_ok(), "{cc}: unknown zone {zone}");
            }
        }
    }
}
