//! HTTP API exposing the catalog, the providers and the comparison engine
//!
//! Every endpoint answers JSON. Input is validated before any provider is
//! called; a rejected request gets `400` with `{error, field}`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use calcompare_common::utils::{normalize_country_code, validate_year, validate_zone_id};
use calcompare_common::{CompareError, ComparisonResult, Holiday, ZoneStatus};
use calcompare_engine::{countries, Country};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::state::AppState;

const ENDPOINTS: &[&str] = &[
    "/api/countries",
    "/api/holidays",
    "/api/timezones",
    "/api/zone-status",
    "/api/compare",
];

/// Error returned by a handler
#[derive(Debug)]
pub enum ApiError {
    /// Caller input was rejected
    BadRequest {
        /// What was wrong
        message: String,
        /// Query parameter at fault
        field: Option<String>,
    },
    /// Anything else
    Internal(String),
}

/// JSON body of an error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable description
    pub error: String,
    /// Query parameter at fault, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<CompareError> for ApiError {
    fn from(err: CompareError) -> Self {
        match err {
            CompareError::Validation { message, field } => ApiError::BadRequest { message, field },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest { message, field } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    field,
                },
            ),
            ApiError::Internal(message) => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal server error".to_string(),
                        field: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Query for `/api/holidays`
#[derive(Debug, Deserialize)]
pub struct HolidaysQuery {
    /// ISO-2 country code
    pub country: Option<String>,
    /// Calendar year
    pub year: Option<String>,
}

/// Query for `/api/timezones`
#[derive(Debug, Deserialize)]
pub struct TimezonesQuery {
    /// ISO-2 country code
    pub country: Option<String>,
}

/// Query for `/api/zone-status`
#[derive(Debug, Deserialize)]
pub struct ZoneStatusQuery {
    /// IANA zone identifier
    pub zone: Option<String>,
}

/// Query for `/api/compare`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    /// First country, ISO-2
    pub country_a: Option<String>,
    /// Second country, ISO-2
    pub country_b: Option<String>,
    /// Calendar year
    pub year: Option<String>,
}

/// Body of `/api/countries`
#[derive(Debug, Serialize)]
pub struct CountriesResponse {
    /// Number of countries
    pub count: usize,
    /// The catalog
    pub countries: &'static [Country],
}

/// Create the API router with all endpoints.
///
/// `request_timeout` has to exceed `Config::comparison_budget`, otherwise a
/// comparison still waiting on a slow upstream is answered with 408.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/countries", get(list_countries))
        .route("/api/holidays", get(get_holidays))
        .route("/api/timezones", get(get_timezones))
        .route("/api/zone-status", get(get_zone_status))
        .route("/api/compare", get(compare))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "calcompare API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_countries() -> Json<CountriesResponse> {
    let countries = countries();
    Json(CountriesResponse {
        count: countries.len(),
        countries,
    })
}

async fn get_holidays(
    State(state): State<AppState>,
    Query(query): Query<HolidaysQuery>,
) -> ApiResult<Vec<Holiday>> {
    let country = country_param(query.country.as_deref(), "country")?;
    let year = year_param(query.year.as_deref())?;

    Ok(Json(
        state.engine.holiday_provider().get_holidays(&country, year).await,
    ))
}

async fn get_timezones(
    State(state): State<AppState>,
    Query(query): Query<TimezonesQuery>,
) -> ApiResult<Vec<String>> {
    let country = country_param(query.country.as_deref(), "country")?;
    Ok(Json(state.engine.directory().zones_for(&country)))
}

async fn get_zone_status(
    State(state): State<AppState>,
    Query(query): Query<ZoneStatusQuery>,
) -> ApiResult<Option<ZoneStatus>> {
    let zone = required(query.zone.as_deref(), "zone")?;
    validate_zone_id(zone)?;

    Ok(Json(state.engine.zone_provider().get_zone_status(zone).await))
}

async fn compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<ComparisonResult> {
    let country_a = country_param(query.country_a.as_deref(), "countryA")?;
    let country_b = country_param(query.country_b.as_deref(), "countryB")?;
    let year = year_param(query.year.as_deref())?;

    if country_a == country_b {
        return Err(
            CompareError::validation_field("countryA and countryB must differ", "countryB").into(),
        );
    }

    info!(country_a = %country_a, country_b = %country_b, year, "comparing countries");
    Ok(Json(state.engine.compare(&country_a, &country_b, year).await))
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, CompareError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CompareError::validation_field(format!("missing query parameter '{field}'"), field))
}

fn country_param(value: Option<&str>, field: &str) -> Result<String, CompareError> {
    normalize_country_code(required(value, field)?, field)
}

fn year_param(value: Option<&str>) -> Result<i32, CompareError> {
    let raw = required(value, "year")?;
    let year = raw
        .trim()
        .parse::<i32>()
        .map_err(|_| CompareError::validation_field(format!("'{raw}' is not a valid year"), "year"))?;
    validate_year(year)
}

/// Serve the API on `bind_address` until Ctrl-C
pub async fn start_server(
    state: AppState,
    bind_address: &str,
    request_timeout: Duration,
) -> anyhow::Result<()> {
    let app = create_router(state, request_timeout);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!("calcompare API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("calcompare API has shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {:?}", e);
        return;
    }
    info!("Received shutdown signal, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(None, "zone").is_err());
        assert!(required(Some("  "), "zone").is_err());
        assert_eq!(required(Some("UTC"), "zone").unwrap(), "UTC");
    }

    #[test]
    fn test_year_param() {
        assert_eq!(year_param(Some("2025")).unwrap(), 2025);
        assert_eq!(year_param(Some(" 2030 ")).unwrap(), 2030);

        for bad in [None, Some("twenty"), Some("1999"), Some("2101"), Some("")] {
            let err = year_param(bad).unwrap_err();
            match err {
                CompareError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("year")),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let api: ApiError = CompareError::validation_field("bad", "countryA").into();
        assert!(matches!(api, ApiError::BadRequest { field: Some(ref f), .. } if f == "countryA"));
        assert_eq!(api.into_response().status(), StatusCode::BAD_REQUEST);

        let api: ApiError = CompareError::network("down").into();
        assert_eq!(api.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
