//! Time source abstraction.
//!
//! Cache expiry and the local zone fallback both depend on "now"; routing
//! them through [`Clock`] lets tests drive time explicitly.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of the current instant.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock shared between a cache and the provider that owns it.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl SystemClock {
    /// The system clock behind an `Arc`.
    pub fn shared() -> SharedClock {
        Arc::new(Self)
    }
}
