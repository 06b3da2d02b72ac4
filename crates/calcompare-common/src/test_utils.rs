//! Test doubles shared by the workspace's test suites.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for dependent crates' dev-dependencies.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use url::Url;

use crate::clock::Clock;
use crate::fetch::{FetchError, HttpTransport};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock frozen at `instant`.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(instant),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let step = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        *self.now.lock() += step;
    }

    /// Jump to `instant`.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualClock {
    /// Mid-January, when northern-hemisphere zones are on standard time.
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Canned response of a [`ScriptedTransport`] route.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 2xx with this JSON body
    Json(Value),
    /// Non-success HTTP status
    Status(u16),
    /// Connection-level failure
    Transport(String),
    /// Client timeout
    Timeout,
}

impl Scripted {
    fn into_result(self, url: &Url) -> Result<Value, FetchError> {
        let url = url.to_string();
        match self {
            Scripted::Json(body) => Ok(body),
            Scripted::Status(status) => Err(FetchError::Status { url, status }),
            Scripted::Transport(message) => Err(FetchError::Transport { url, message }),
            Scripted::Timeout => Err(FetchError::Timeout { url }),
        }
    }
}

#[derive(Debug)]
struct Route {
    needle: String,
    responses: VecDeque<Scripted>,
    last: Option<Scripted>,
}

/// In-memory transport answering from per-URL scripts.
///
/// A request is routed to the first route whose needle is a substring of the
/// URL. Queued responses are consumed in order; once a queue is drained its
/// final response repeats. Unrouted requests fail as transport errors.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer URLs containing `needle` with `responses`, in order.
    pub fn on(&self, needle: impl Into<String>, responses: Vec<Scripted>) -> &Self {
        self.routes.lock().push(Route {
            needle: needle.into(),
            responses: responses.into(),
            last: None,
        });
        self
    }

    /// Answer URLs containing `needle` with `response`, forever.
    pub fn always(&self, needle: impl Into<String>, response: Scripted) -> &Self {
        self.on(needle, vec![response])
    }

    /// Every URL requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of requests whose URL contains `needle`.
    pub fn call_count(&self, needle: &str) -> usize {
        self.calls.lock().iter().filter(|url| url.contains(needle)).count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        let text = url.to_string();
        self.calls.lock().push(text.clone());

        let response = {
            let mut routes = self.routes.lock();
            routes
                .iter_mut()
                .find(|route| text.contains(&route.needle))
                .and_then(|route| {
                    if let Some(next) = route.responses.pop_front() {
                        route.last = Some(next.clone());
                        Some(next)
                    } else {
                        route.last.clone()
                    }
                })
        };

        response
            .unwrap_or_else(|| Scripted::Transport(format!("no scripted route for {text}")))
            .into_result(url)
    }
}
