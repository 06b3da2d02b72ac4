//! Integration tests for the calcompare HTTP API

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use calcompare_common::test_utils::{ManualClock, Scripted, ScriptedTransport};
use calcompare_common::{FetchError, HttpTransport, ResilientFetcher};
use calcompare_config::Config;
use calcompare_server::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use url::Url;

/// Upstreams that never answer within the client timeout
struct HangingTransport;

#[async_trait]
impl HttpTransport for HangingTransport {
    async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Err(FetchError::Timeout { url: url.to_string() })
    }
}

fn router(config: &Config, transport: Arc<dyn HttpTransport>) -> Router {
    let fetcher =
        ResilientFetcher::with_transport(&config.fetch.to_fetcher_config(), transport).unwrap();
    let state = AppState::with_fetcher(config, fetcher, Arc::new(ManualClock::default()));
    create_router(state, config.server.request_timeout())
}

fn app(transport: Arc<ScriptedTransport>) -> Router {
    let mut config = Config::default();
    config.providers.nager_base_url = "https://nager.test/api/v3".to_string();
    config.providers.worldtime_base_url = "https://worldtime.test/api/timezone".to_string();
    config.fetch.max_retries = 0;
    config.fetch.rate_limit_per_sec = 1000;
    router(&config, transport)
}

fn scripted() -> Arc<ScriptedTransport> {
    let transport = Arc::new(ScriptedTransport::new());
    transport.always(
        "PublicHolidays/2025/US",
        Scripted::Json(json!([
            {"date": "2025-01-01", "localName": "New Year's Day", "name": "New Year's Day", "countryCode": "US"},
            {"date": "2025-07-04", "localName": "Independence Day", "name": "Independence Day", "countryCode": "US"}
        ])),
    );
    transport.always(
        "PublicHolidays/2025/CO",
        Scripted::Json(json!([
            {"date": "2025-01-01", "localName": "Año Nuevo", "name": "New Year's Day", "countryCode": "CO"}
        ])),
    );
    transport.always(
        "America/Bogota",
        Scripted::Json(json!({"timezone": "America/Bogota", "utc_offset": "-05:00", "dst": false})),
    );
    transport.always("worldtime.test", Scripted::Status(503));
    transport
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_index_and_health() {
    let (status, body) = get(app(scripted()), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 5);

    let (status, body) = get(app(scripted()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_countries_lists_195() {
    let (status, body) = get(app(scripted()), "/api/countries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 195);
    assert_eq!(body["countries"].as_array().unwrap().len(), 195);
    assert!(body["countries"][0]["name_es"].is_string());
}

#[tokio::test]
async fn test_holidays_endpoint() {
    let (status, body) = get(app(scripted()), "/api/holidays?country=us&year=2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["date"], "2025-01-01");
    assert_eq!(body[0]["localName"], "New Year's Day");
}

#[tokio::test]
async fn test_timezones_endpoint() {
    let (status, body) = get(app(scripted()), "/api/timezones?country=CO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["America/Bogota"]));

    let (_, body) = get(app(scripted()), "/api/timezones?country=US").await;
    assert_eq!(body.as_array().unwrap().len(), 29);
}

#[tokio::test]
async fn test_zone_status_endpoint() {
    let (status, body) = get(app(scripted()), "/api/zone-status?zone=America/Bogota").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"zone": "America/Bogota", "utc_offset": "-05:00", "dst": false}));

    let (status, body) = get(app(scripted()), "/api/zone-status?zone=Mars/Base").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_compare_endpoint() {
    let (status, body) =
        get(app(scripted()), "/api/compare?countryA=us&countryB=co&year=2025").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["inputs"], json!({"countryA": "US", "countryB": "CO", "year": 2025}));
    assert_eq!(body["holidays"]["common"][0]["nameB"], "Año Nuevo");
    assert_eq!(body["holidays"]["onlyA"][0]["date"], "2025-07-04");
    assert_eq!(body["timezones"]["A"].as_array().unwrap().len(), 29);
    assert_eq!(body["timezones"]["B"][0]["zone"], "America/Bogota");
    assert_eq!(body["timezones"]["commonOffsetNow"]["hasOverlap"], true);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let cases = [
        ("/api/holidays?country=USA&year=2025", "country"),
        ("/api/holidays?country=US", "year"),
        ("/api/holidays?country=US&year=1999", "year"),
        ("/api/holidays?country=US&year=soon", "year"),
        ("/api/timezones", "country"),
        ("/api/zone-status?zone=../etc/passwd", "zone"),
        ("/api/compare?countryA=US&countryB=us&year=2025", "countryB"),
        ("/api/compare?countryA=U1&countryB=CO&year=2025", "countryA"),
    ];

    for (uri, field) in cases {
        let (status, body) = get(app(scripted()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["field"], field, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_cors_headers_present() {
    let response = app(scripted())
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test(start_paused = true)]
async fn test_compare_against_hanging_upstreams_degrades() {
    // Default retry and timeout settings; only the request rate is lifted
    let mut config = Config::default();
    config.fetch.rate_limit_per_sec = 1000;
    assert!(config.validate_all().is_ok());
    let app = router(&config, Arc::new(HangingTransport));

    let started = tokio::time::Instant::now();
    let (status, body) = get(app, "/api/compare?countryA=US&countryB=CO&year=2025").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(started.elapsed(), config.fetch.to_fetcher_config().worst_case_latency());
    assert_eq!(body["holidays"]["common"], json!([]));
    assert_eq!(body["holidays"]["onlyA"], json!([]));
    assert_eq!(body["holidays"]["onlyB"], json!([]));
    assert_eq!(body["timezones"]["A"].as_array().unwrap().len(), 29);
    assert_eq!(body["timezones"]["B"][0]["utc_offset"], "-05:00");
}
