//! Current UTC offset of an IANA zone
//!
//! The live answer comes from WorldTimeAPI. When it is unreachable or returns
//! something we cannot use, the offset is computed from the bundled tz
//! database at the provider clock's "now". That path cannot tell whether
//! daylight saving is in effect and always reports `dst = false`.

use calcompare_common::utils::{format_utc_offset, is_valid_utc_offset};
use calcompare_common::{
    CacheKey, CompareError, ResilientFetcher, Result, SharedClock, TtlCache, ZoneStatus,
};
use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct WorldTimeResponse {
    utc_offset: String,
    #[serde(default)]
    dst: bool,
}

/// Resolves zone statuses, live first and locally as a fallback
#[derive(Debug)]
pub struct ZoneStatusProvider {
    fetcher: ResilientFetcher,
    cache: TtlCache<ZoneStatus>,
    worldtime_base_url: String,
    clock: SharedClock,
}

impl ZoneStatusProvider {
    /// Create a provider with its own cache
    pub fn new(
        fetcher: ResilientFetcher,
        worldtime_base_url: impl Into<String>,
        ttl: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            fetcher,
            cache: TtlCache::new("zone_status", ttl, clock.clone()),
            worldtime_base_url: worldtime_base_url.into(),
            clock,
        }
    }

    /// Status of `zone` right now, or `None` if the zone is unknown
    #[instrument(skip(self))]
    pub async fn get_zone_status(&self, zone: &str) -> Option<ZoneStatus> {
        let key = CacheKey::zone_status(zone).to_string();
        if let Some(cached) = self.cache.get(&key) {
            return Some(cached);
        }

        let status = match self.fetch_live(zone).await {
            Ok(status) => status,
            Err(e) => {
                warn!(zone, error = %e, "live zone status unavailable, computing locally");
                match local_zone_status(zone, self.clock.now()) {
                    Ok(status) => status,
                    Err(e) => {
                        debug!(zone, error = %e, "zone cannot be resolved");
                        return None;
                    }
                }
            }
        };

        self.cache.set(key, status.clone());
        Some(status)
    }

    async fn fetch_live(&self, zone: &str) -> Result<ZoneStatus> {
        let url = format!("{}/{zone}", self.worldtime_base_url.trim_end_matches('/'));
        let body: WorldTimeResponse = self.fetcher.fetch(&url).await?;

        if !is_valid_utc_offset(&body.utc_offset) {
            return Err(CompareError::upstream(format!(
                "WorldTimeAPI returned malformed utc_offset '{}'",
                body.utc_offset
            )));
        }

        Ok(ZoneStatus {
            zone: zone.to_string(),
            utc_offset: body.utc_offset,
            dst: body.dst,
        })
    }
}

/// Offset of `zone` at `at` from the bundled tz database, with `dst = false`
pub fn local_zone_status(zone: &str, at: DateTime<Utc>) -> Result<ZoneStatus> {
    let tz: Tz = zone
        .parse()
        .map_err(|_| CompareError::timezone("Unknown IANA timezone", zone))?;
    let seconds = tz.offset_from_utc_datetime(&at.naive_utc()).fix().local_minus_utc();

    Ok(ZoneStatus {
        zone: zone.to_string(),
        utc_offset: format_utc_offset(seconds),
        dst: false,
    })
}
