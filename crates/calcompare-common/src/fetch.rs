//! Resilient HTTP fetching for upstream data providers
//!
//! [`ResilientFetcher`] wraps a [`HttpTransport`] with rate limiting and
//! bounded retries driven by `tokio_retry`. The schedule and the retry
//! decision live in [`RetryPolicy`], pure functions of the attempt number and
//! the observed error, so they can be tested without any I/O.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use thiserror::Error;
use tokio_retry::RetryIf;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{CompareError, Result};

/// Failure of a single fetch, or of the last attempt once retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request URL could not be built
    #[error("invalid request URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL text
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// The request did not complete within the client timeout
    #[error("request to {url} timed out")]
    Timeout {
        /// Target URL, query stripped
        url: String,
    },

    /// Connection-level failure (DNS, refused, reset, TLS)
    #[error("transport failure for {url}: {message}")]
    Transport {
        /// Target URL, query stripped
        url: String,
        /// Description of the failure
        message: String,
    },

    /// The upstream answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Target URL, query stripped
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The body was not the JSON we expected
    #[error("undecodable response from {url}: {message}")]
    Decode {
        /// Target URL, query stripped
        url: String,
        /// Decoder error description
        message: String,
    },
}

impl FetchError {
    /// HTTP status of the failed attempt, if the upstream answered
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could succeed.
    ///
    /// Every failure observed on the wire is retried the same way; only a
    /// request that could never be sent is final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl { .. })
    }
}

/// Outcome of [`RetryPolicy::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again
    RetryAfter(Duration),
    /// Stop and surface the last error
    GiveUp,
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `n * base_delay`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry budget and backoff unit
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed
    pub fn decide(&self, attempt: u32, error: &FetchError) -> RetryDecision {
        if attempt <= self.max_retries && error.is_retryable() {
            RetryDecision::RetryAfter(self.backoff(attempt))
        } else {
            RetryDecision::GiveUp
        }
    }

    /// Delay before the retry that follows failed attempt `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Sleep schedule between attempts: `base_delay * n` for each retry `n`
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let policy = *self;
        (1..=self.max_retries).map(move |attempt| policy.backoff(attempt))
    }

    /// Total number of attempts this policy allows
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// One GET returning a JSON document
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a single request; non-2xx statuses are errors
    async fn get_json(&self, url: &Url) -> std::result::Result<Value, FetchError>;
}

/// Configuration for outbound requests
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Linear backoff unit
    pub backoff_base: Duration,
    /// Outbound requests allowed per second
    pub rate_limit_per_sec: u32,
    /// Connection pool max idle connections per host
    pub max_idle_per_host: usize,
    /// User-Agent header sent upstream
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
            rate_limit_per_sec: 20,
            max_idle_per_host: 10,
            user_agent: concat!("calcompare/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetcherConfig {
    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff unit
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_base)
    }

    /// Longest a single fetch can take: one timeout per attempt plus every backoff
    pub fn worst_case_latency(&self) -> Duration {
        let policy = self.retry_policy();
        let waiting: Duration = policy.delays().sum();
        self.timeout.saturating_mul(policy.max_attempts()) + waiting
    }
}

/// reqwest-backed transport with connection pooling
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the underlying HTTP client
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CompareError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &Url) -> std::result::Result<Value, FetchError> {
        let shown = display_url(url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { url: shown.clone() }
            } else {
                FetchError::Transport {
                    url: shown.clone(),
                    message: e.without_url().to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| FetchError::Decode {
            url: shown,
            message: e.without_url().to_string(),
        })
    }
}

/// Rate-limited HTTP GET with bounded retry and linear backoff
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl ResilientFetcher {
    /// Create a fetcher talking to the network through reqwest
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Self::with_transport(config, transport)
    }

    /// Create a fetcher over an arbitrary transport
    pub fn with_transport(config: &FetcherConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| CompareError::config("Rate limit must be greater than 0"))?,
        );

        Ok(Self {
            transport,
            policy: config.retry_policy(),
            rate_limiter: Arc::new(DefaultDirectRateLimiter::direct(quota)),
        })
    }

    /// Retry policy in effect
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GET `url` and return the decoded JSON body.
    ///
    /// Suspends across retries; worst-case latency is the sum of all backoff
    /// delays plus one timeout per attempt.
    #[instrument(skip(self, url), fields(url = %strip_query(url)))]
    pub async fn fetch_json(&self, url: &str) -> std::result::Result<Value, FetchError> {
        let url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: strip_query(url).to_string(),
            source,
        })?;

        let policy = self.policy;
        let url = &url;
        let mut attempt = 0;

        RetryIf::spawn(
            policy.delays(),
            || {
                attempt += 1;
                let attempt = attempt;
                async move {
                    self.rate_limiter.until_ready().await;
                    debug!(attempt, "sending request");

                    let outcome = self.transport.get_json(url).await;
                    match &outcome {
                        Ok(_) if attempt > 1 => info!(attempt, "request succeeded after retry"),
                        Ok(_) => {}
                        Err(error) => match policy.decide(attempt, error) {
                            RetryDecision::RetryAfter(delay) => warn!(
                                attempt,
                                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                                error = %error,
                                "request failed, will retry"
                            ),
                            RetryDecision::GiveUp => {
                                warn!(attempt, error = %error, "request failed, giving up")
                            }
                        },
                    }
                    outcome
                }
            },
            FetchError::is_retryable,
        )
        .await
    }

    /// GET `url` and deserialize the body into `T`
    pub async fn fetch<T>(&self, url: &str) -> std::result::Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let body = self.fetch_json(url).await?;
        serde_json::from_value(body).map_err(|e| FetchError::Decode {
            url: strip_query(url).to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("transport", &"<dyn HttpTransport>")
            .field("policy", &self.policy)
            .finish()
    }
}

// Query strings may carry API keys; never log or embed them in errors.
fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Scripted, ScriptedTransport};
    use serde_json::json;

    fn fetcher(transport: Arc<ScriptedTransport>) -> ResilientFetcher {
        let config = FetcherConfig::default().with_rate_limit(1000);
        ResilientFetcher::with_transport(&config, transport).unwrap()
    }

    fn status_error(status: u16) -> FetchError {
        FetchError::Status {
            url: "https://example.test/x".to_string(),
            status,
        }
    }

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(3));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_decide_retries_within_budget() {
        let policy = RetryPolicy::default();
        let error = status_error(503);

        assert_eq!(
            policy.decide(1, &error),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            policy.decide(2, &error),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(policy.decide(3, &error), RetryDecision::GiveUp);
    }

    #[test]
    fn test_decide_treats_client_errors_like_server_errors() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, &status_error(404)),
            policy.decide(1, &status_error(500))
        );
        assert!(matches!(
            policy.decide(1, &FetchError::Timeout { url: "u".into() }),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test]
    fn test_decide_gives_up_on_invalid_url() {
        let policy = RetryPolicy::default();
        let error = FetchError::InvalidUrl {
            url: "::".to_string(),
            source: Url::parse("::").unwrap_err(),
        };
        assert_eq!(policy.decide(1, &error), RetryDecision::GiveUp);
    }

    #[test]
    fn test_delays_follow_backoff() {
        let delays: Vec<_> = RetryPolicy::default().delays().collect();
        assert_eq!(delays, vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).delays().count(), 0);
    }

    #[test]
    fn test_worst_case_latency() {
        // 3 attempts of 10s plus 1s and 2s of backoff
        assert_eq!(FetcherConfig::default().worst_case_latency(), Duration::from_secs(33));
        let single = FetcherConfig::default().with_max_retries(0);
        assert_eq!(single.worst_case_latency(), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_retries_policy() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.decide(1, &status_error(503)), RetryDecision::GiveUp);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_display_url_strips_query() {
        let url = Url::parse("https://calendarific.com/api/v2/holidays?api_key=secret&year=2025")
            .unwrap();
        let shown = display_url(&url);
        assert!(!shown.contains("secret"));
        assert_eq!(shown, "https://calendarific.com/api/v2/holidays");
        assert_eq!(strip_query("https://a.test/p?k=v"), "https://a.test/p");
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = FetcherConfig::default().with_rate_limit(0);
        let result = ResilientFetcher::with_transport(&config, Arc::new(ScriptedTransport::new()));
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds_with_linear_delays() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "example.test",
            vec![
                Scripted::Status(503),
                Scripted::Status(503),
                Scripted::Json(json!({"ok": true})),
            ],
        );
        let fetcher = fetcher(transport.clone());

        let started = tokio::time::Instant::now();
        let body = fetcher.fetch_json("https://example.test/data").await.unwrap();

        assert_eq!(body, json!({"ok": true}));
        assert_eq!(transport.call_count("example.test"), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "example.test",
            vec![
                Scripted::Status(500),
                Scripted::Transport("connection refused".to_string()),
                Scripted::Status(502),
            ],
        );
        let fetcher = fetcher(transport.clone());

        let err = fetcher.fetch_json("https://example.test/data").await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(transport.call_count("example.test"), 3);
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_sent() {
        let transport = Arc::new(ScriptedTransport::new());
        let fetcher = fetcher(transport.clone());

        let err = fetcher.fetch_json("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_typed_fetch_decode_error() {
        #[derive(Debug, serde::Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            value: u32,
        }

        let transport = Arc::new(ScriptedTransport::new());
        transport.always("example.test", Scripted::Json(json!({"other": "field"})));
        let fetcher = fetcher(transport);

        let err = fetcher
            .fetch::<Expected>("https://example.test/typed")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
