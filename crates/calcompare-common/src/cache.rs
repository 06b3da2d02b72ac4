//! In-memory TTL cache shielding providers from repeated upstream calls
//!
//! Entries are stamped with the owning cache's [`Clock`] on insertion and are
//! checked lazily: an expired entry is dropped by the `get` that observes it.
//! There is no background sweep.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::clock::SharedClock;

/// Logical cache key, rendered into the composite string used for storage
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// Public holidays of one country for one year
    Holidays {
        /// ISO-3166 alpha-2 code, upper case
        country: String,
        /// Calendar year
        year: i32,
    },
    /// Current status of one IANA zone
    ZoneStatus {
        /// IANA identifier
        zone: String,
    },
}

impl CacheKey {
    /// Key for a country's holidays in a year
    pub fn holidays(country: &str, year: i32) -> Self {
        Self::Holidays {
            country: country.to_ascii_uppercase(),
            year,
        }
    }

    /// Key for a zone status snapshot
    pub fn zone_status(zone: &str) -> Self {
        Self::ZoneStatus {
            zone: zone.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Holidays { country, year } => write!(f, "holidays_{country}_{year}"),
            CacheKey::ZoneStatus { zone } => write!(f, "zone_status_{zone}"),
        }
    }
}

/// A cached value and the instant it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Stored value
    pub value: V,
    /// Insertion instant according to the cache's clock
    pub inserted_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Whether the entry is still valid at `now` under `ttl`.
    ///
    /// A clock that moved backwards counts as zero age.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.inserted_at).to_std() {
            Ok(age) => age <= ttl,
            Err(_) => true,
        }
    }
}

/// Key/value store with a fixed per-cache time-to-live
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    clock: SharedClock,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache named `name` (used in logs)
    pub fn new(name: &'static str, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            name,
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up `key`, evicting it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                debug!(cache = self.name, key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                debug!(cache = self.name, key, "cache entry expired");
                None
            }
            None => {
                debug!(cache = self.name, key, "cache miss");
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any previous entry
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Number of stored entries, including expired ones not yet observed
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Time-to-live applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualClock;
    use std::sync::Arc;

    fn cache_with_clock(ttl: Duration) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::new("test", ttl, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(CacheKey::holidays("us", 2025).to_string(), "holidays_US_2025");
        assert_eq!(
            CacheKey::zone_status("America/New_York").to_string(),
            "zone_status_America/New_York"
        );
        assert_eq!(CacheKey::holidays("co", 2025), CacheKey::holidays("CO", 2025));
    }

    #[test]
    fn test_set_then_get_within_ttl() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(3600));
        cache.set("k", "v".to_string());

        clock.advance(Duration::from_secs(3599));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_entry_valid_exactly_at_ttl() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        cache.set("k", "v".to_string());

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        cache.set("k", "v".to_string());
        cache.set("other", "w".to_string());
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::from_secs(61));
        // Nothing is swept until a lookup observes the expiry
        assert_eq!(cache.len(), 2);
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_overwrites_and_refreshes() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        cache.set("k", "old".to_string());
        clock.advance(Duration::from_secs(50));
        cache.set("k", "new".to_string());
        clock.advance(Duration::from_secs(50));

        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn test_missing_key() {
        let (cache, _clock) = cache_with_clock(Duration::from_secs(60));
        assert!(cache.is_empty());
        assert!(cache.get("absent").is_none());
    }
}
