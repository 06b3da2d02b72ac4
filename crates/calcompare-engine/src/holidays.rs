//! Public holiday lookup with a primary and a secondary upstream
//!
//! Nager.Date is always asked first. Calendarific is consulted only when the
//! primary fails or returns nothing, and only if an API key is configured.
//! The provider never fails outward: when no upstream yields data the result
//! is an empty list and a warning is logged.

use calcompare_common::{
    CacheKey, CompareError, FetchError, Holiday, HolidaySource, ResilientFetcher, Result,
    SharedClock, TtlCache,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Upstream endpoints and cache lifetime for [`HolidayProvider`]
#[derive(Clone)]
pub struct HolidayProviderConfig {
    /// Nager.Date v3 API root
    pub nager_base_url: String,
    /// Calendarific v2 API root
    pub calendarific_base_url: String,
    /// Calendarific key; the secondary provider is skipped without one
    pub calendarific_api_key: Option<String>,
    /// Lifetime of a cached holiday list
    pub ttl: Duration,
}

impl Default for HolidayProviderConfig {
    fn default() -> Self {
        Self {
            nager_base_url: "https://date.nager.at/api/v3".to_string(),
            calendarific_base_url: "https://calendarific.com/api/v2".to_string(),
            calendarific_api_key: None,
            ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl std::fmt::Debug for HolidayProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HolidayProviderConfig")
            .field("nager_base_url", &self.nager_base_url)
            .field("calendarific_base_url", &self.calendarific_base_url)
            .field(
                "calendarific_api_key",
                &self.calendarific_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// A holiday list together with the upstream that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayLookup {
    /// Upstream that answered
    pub source: HolidaySource,
    /// Normalized holidays, in upstream order
    pub holidays: Vec<Holiday>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NagerHoliday {
    date: NaiveDate,
    #[serde(default)]
    local_name: Option<String>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CalendarificHoliday {
    #[serde(default)]
    name: String,
    date: CalendarificDate,
}

#[derive(Debug, Deserialize)]
struct CalendarificDate {
    iso: String,
}

/// Fetches, normalizes and caches per-country holiday calendars
#[derive(Debug)]
pub struct HolidayProvider {
    fetcher: ResilientFetcher,
    cache: TtlCache<HolidayLookup>,
    config: HolidayProviderConfig,
}

impl HolidayProvider {
    /// Create a provider with its own cache
    pub fn new(fetcher: ResilientFetcher, config: HolidayProviderConfig, clock: SharedClock) -> Self {
        let cache = TtlCache::new("holidays", config.ttl, clock);
        Self {
            fetcher,
            cache,
            config,
        }
    }

    /// Holidays observed by `country_code` in `year`; empty when unavailable
    pub async fn get_holidays(&self, country_code: &str, year: i32) -> Vec<Holiday> {
        self.lookup(country_code, year)
            .await
            .map(|found| found.holidays)
            .unwrap_or_default()
    }

    /// Holidays plus the upstream that supplied them, or `None` if every
    /// upstream failed or returned nothing
    #[instrument(skip(self))]
    pub async fn lookup(&self, country_code: &str, year: i32) -> Option<HolidayLookup> {
        let country = country_code.trim().to_ascii_uppercase();
        let key = CacheKey::holidays(&country, year).to_string();

        if let Some(cached) = self.cache.get(&key) {
            return Some(cached);
        }

        let found = match self.fetch_primary(&country, year).await {
            Ok(holidays) if !holidays.is_empty() => Some(HolidayLookup {
                source: HolidaySource::NagerDate,
                holidays,
            }),
            Ok(_) => {
                info!(country = %country, year, "primary provider returned no holidays");
                None
            }
            Err(e) => {
                warn!(country = %country, year, error = %e, "primary holiday provider failed");
                None
            }
        };

        let found = match found {
            Some(found) => Some(found),
            None => self.try_secondary(&country, year).await,
        };

        match found {
            Some(found) => {
                info!(
                    country = %country,
                    year,
                    source = %found.source,
                    count = found.holidays.len(),
                    "loaded holidays"
                );
                self.cache.set(key, found.clone());
                Some(found)
            }
            None => {
                warn!(country = %country, year, "no holiday data available from any provider");
                None
            }
        }
    }

    async fn fetch_primary(&self, country: &str, year: i32) -> std::result::Result<Vec<Holiday>, FetchError> {
        let url = format!(
            "{}/PublicHolidays/{year}/{country}",
            self.config.nager_base_url.trim_end_matches('/')
        );

        let items: Vec<NagerHoliday> = self.fetcher.fetch(&url).await?;
        Ok(items
            .into_iter()
            .map(|item| {
                let holiday = Holiday::new(item.date, item.name).with_country(country);
                match item.local_name {
                    Some(local) => holiday.with_local_name(local),
                    None => holiday,
                }
            })
            .collect())
    }

    async fn try_secondary(&self, country: &str, year: i32) -> Option<HolidayLookup> {
        let Some(api_key) = self
            .config
            .calendarific_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        else {
            debug!(country, year, "no Calendarific key configured, skipping secondary provider");
            return None;
        };

        match self.fetch_secondary(api_key, country, year).await {
            Ok(holidays) if !holidays.is_empty() => Some(HolidayLookup {
                source: HolidaySource::Calendarific,
                holidays,
            }),
            Ok(_) => {
                info!(country, year, "secondary provider returned no holidays");
                None
            }
            Err(e) => {
                warn!(country, year, error = %e, "secondary holiday provider failed");
                None
            }
        }
    }

    async fn fetch_secondary(&self, api_key: &str, country: &str, year: i32) -> Result<Vec<Holiday>> {
        let url = calendarific_url(&self.config.calendarific_base_url, api_key, country, year)?;
        let body = self.fetcher.fetch_json(url.as_str()).await?;
        Ok(parse_calendarific(&body, country))
    }
}

fn calendarific_url(base: &str, api_key: &str, country: &str, year: i32) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/holidays", base.trim_end_matches('/')))
        .map_err(|e| CompareError::config_with_source("Invalid Calendarific base URL", e))?;
    url.query_pairs_mut()
        .append_pair("api_key", api_key)
        .append_pair("country", country)
        .append_pair("year", &year.to_string());
    Ok(url)
}

// `response` is an object on success but an empty array on API errors.
fn parse_calendarific(body: &Value, country: &str) -> Vec<Holiday> {
    let Some(items) = body
        .get("response")
        .and_then(|response| response.get("holidays"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let parsed: CalendarificHoliday = match serde_json::from_value(item.clone()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!(error = %e, "skipping malformed Calendarific record");
                    return None;
                }
            };

            let date = parsed
                .date
                .iso
                .get(..10)
                .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());

            match date {
                Some(date) => Some(
                    Holiday::new(date, parsed.name.clone())
                        .with_local_name(parsed.name)
                        .with_country(country),
                ),
                None => {
                    debug!(iso = %parsed.date.iso, "skipping Calendarific record with unparseable date");
                    None
                }
            }
        })
        .collect()
}
