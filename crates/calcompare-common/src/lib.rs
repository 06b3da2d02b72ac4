//! # calcompare common
//!
//! Shared types, the TTL cache, the resilient HTTP fetcher and logging setup
//! used by every crate in the calcompare workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod clock;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

// Re-export commonly used types
pub use cache::{CacheKey, TtlCache};
pub use clock::{Clock, SharedClock, SystemClock};
pub use error::{CompareError, Result};
pub use fetch::{
    FetchError, FetcherConfig, HttpTransport, ReqwestTransport, ResilientFetcher, RetryDecision,
    RetryPolicy,
};
pub use logging::{init_default_logging, init_logging, LoggingConfig};
pub use types::*;
