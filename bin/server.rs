// Sales Dashboard - JSON API Server
// Serves dashboard snapshots to the chart front-end

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sales_dashboard::{
    DashboardConfig, DashboardEngine, DashboardError, DashboardSnapshot, FilterCriteria,
    RecordStore,
};

/// Shared application state. Records are loaded once and never mutated.
#[derive(Clone)]
struct AppState {
    store: Arc<RecordStore>,
    engine: Arc<DashboardEngine>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Engine errors mapped to HTTP responses
struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DashboardError::InvalidSelection { .. } => StatusCode::BAD_REQUEST,
            DashboardError::MissingCoordinate { .. } => {
                error!(error = %self.0, "snapshot invariant violated");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ApiResponse::<()>::err(self.0.to_string()))).into_response()
    }
}

/// Query string of GET /api/dashboard. Numbers arrive as text so that blank
/// values mean "no restriction" and bad ones become JSON errors.
#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    region: Option<String>,
    year: Option<String>,
    /// Comma-separated seller names
    sellers: Option<String>,
    top: Option<String>,
}

/// Blank → `None`, otherwise parsed or rejected as an invalid selection
fn parse_optional<T: std::str::FromStr>(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<T>, DashboardError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            DashboardError::invalid_selection(field, format!("'{}' is not a valid number", value))
        }),
    }
}

impl DashboardQuery {
    fn year(&self) -> Result<Option<i32>, DashboardError> {
        parse_optional("year", self.year.as_deref())
    }

    fn top(&self) -> Result<Option<usize>, DashboardError> {
        parse_optional("top", self.top.as_deref())
    }

    fn seller_list(&self) -> Vec<String> {
        self.sellers
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Snapshot for a selection
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardSnapshot>>, ApiError> {
    let criteria = FilterCriteria::from_selection(
        state.engine.config(),
        &state.store,
        query.region.as_deref(),
        query.year()?,
        &query.seller_list(),
    )?;

    let snapshot = state
        .engine
        .snapshot(state.store.records(), &criteria, query.top()?)?;

    Ok(Json(ApiResponse::ok(snapshot)))
}

/// GET /api/sellers - Seller choices, first-seen order
async fn get_sellers(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.store.sellers()))
}

/// GET /api/regions - Region choices
async fn get_regions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.engine.config().regions.clone()))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/sellers", get(get_sellers))
        .route("/regions", get(get_regions))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let records_path = std::env::var("DASHBOARD_RECORDS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/produtos.json"));

    let config = match std::env::var("DASHBOARD_CONFIG") {
        Ok(path) => DashboardConfig::from_file(path)?,
        Err(_) => DashboardConfig::default(),
    };

    let addr: SocketAddr = std::env::var("DASHBOARD_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let store = RecordStore::load(&records_path)?;
    if store.is_empty() {
        warn!(path = ?records_path, "no sales records loaded");
    }

    let state = AppState {
        store: Arc::new(store),
        engine: Arc::new(DashboardEngine::new(config)),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "dashboard API listening");

    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sales_dashboard::TransactionRecord;
    use tower::ServiceExt;

    fn state() -> AppState {
        let day = |m| NaiveDate::from_ymd_opt(2022, m, 1).unwrap();
        let records = vec![
            TransactionRecord::new(day(1), Decimal::from(100), "SP", -22.19, -48.79, "livros", "Ana"),
            TransactionRecord::new(day(2), Decimal::from(50), "BA", -13.29, -41.71, "moveis", "Bruno"),
            TransactionRecord::new(day(3), Decimal::from(70), "SP", -22.19, -48.79, "moveis", "Ana"),
        ];
        AppState {
            store: Arc::new(RecordStore::new(records)),
            engine: Arc::new(DashboardEngine::default()),
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = build_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_dashboard_with_selection() {
        let (status, body) = get_json("/api/dashboard?region=Sudeste&year=2022&top=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_sales"], 2);
        assert_eq!(body["data"]["revenue_by_state"]["rows"][0]["state"], "SP");
    }

    #[tokio::test]
    async fn test_dashboard_seller_filter() {
        let (status, body) = get_json("/api/dashboard?sellers=Bruno").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_sales"], 1);
    }

    #[tokio::test]
    async fn test_invalid_selection_is_bad_request() {
        let (status, body) = get_json("/api/dashboard?year=1990").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = get_json("/api/dashboard?top=50").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_values_mean_no_restriction() {
        let (status, body) = get_json("/api/dashboard?region=&year=&sellers=&top=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_sales"], 3);
        assert_eq!(body["data"]["criteria"]["year"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_unparsable_numbers_are_json_errors() {
        for uri in ["/api/dashboard?year=abc", "/api/dashboard?top=-1"] {
            let (status, body) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["success"], false, "{}", uri);
            assert!(body["error"].as_str().unwrap().contains("not a valid number"));
        }
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional::<i32>("year", None).unwrap(), None);
        assert_eq!(parse_optional::<i32>("year", Some(" ")).unwrap(), None);
        assert_eq!(parse_optional::<i32>("year", Some("2022")).unwrap(), Some(2022));
        assert!(parse_optional::<usize>("top", Some("-1")).is_err());
    }

    #[tokio::test]
    async fn test_sellers_and_regions() {
        let (_, body) = get_json("/api/sellers").await;
        assert_eq!(body["data"], serde_json::json!(["Ana", "Bruno"]));

        let (_, body) = get_json("/api/regions").await;
        assert_eq!(body["data"][0], "Brasil");
    }
}
