//! Service context shared by every request handler

use calcompare_common::{ResilientFetcher, Result, SharedClock, SystemClock};
use calcompare_config::Config;
use calcompare_engine::{
    ComparisonEngine, HolidayProvider, HolidayProviderConfig, StaticZoneDirectory,
    ZoneStatusProvider,
};
use std::sync::Arc;
use tracing::info;

/// Providers and engine, cheap to clone into handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Comparison engine; also owns the providers the single-resource endpoints use
    pub engine: ComparisonEngine,
}

impl AppState {
    /// Build the production context: reqwest transport and wall-clock time
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ResilientFetcher::new(&config.fetch.to_fetcher_config())?;
        Ok(Self::with_fetcher(config, fetcher, SystemClock::shared()))
    }

    /// Build the context over an existing fetcher and clock
    pub fn with_fetcher(config: &Config, fetcher: ResilientFetcher, clock: SharedClock) -> Self {
        let holiday_config = HolidayProviderConfig {
            nager_base_url: config.providers.nager_base_url.clone(),
            calendarific_base_url: config.providers.calendarific_base_url.clone(),
            calendarific_api_key: config.providers.calendarific_key().map(str::to_string),
            ttl: config.cache.holiday_ttl(),
        };

        if holiday_config.calendarific_api_key.is_none() {
            info!("CALENDARIFIC_KEY not set, secondary holiday provider disabled");
        }

        let holidays = HolidayProvider::new(fetcher.clone(), holiday_config, clock.clone());
        let zones = ZoneStatusProvider::new(
            fetcher,
            config.providers.worldtime_base_url.clone(),
            config.cache.zone_status_ttl(),
            clock,
        );

        Self {
            engine: ComparisonEngine::new(
                Arc::new(holidays),
                Arc::new(zones),
                Arc::new(StaticZoneDirectory),
            ),
        }
    }
}
