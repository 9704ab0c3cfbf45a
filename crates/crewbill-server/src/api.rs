//! HTTP/JSON routes for the quote service

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use crewbill_common::{
    BillingPeriod, ErrorKind, Feature, FeatureId, PriceBreakdown, PricingError, SelectionState,
    UserTier,
};
use crewbill_engine::{CurrencyTable, PricingEngine, QuoteCache, UpgradeOption};
use prometheus::Registry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::metrics::{self, QuoteMetrics};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PricingEngine>,
    pub cache: Arc<QuoteCache>,
    pub currencies: Arc<CurrencyTable>,
    pub metrics: QuoteMetrics,
    pub registry: Registry,
    pub default_currency: String,
}

impl AppState {
    pub fn new(engine: PricingEngine, config: &ServerConfig) -> anyhow::Result<Self> {
        let mut currencies = CurrencyTable::default();
        for (code, rate) in &config.currency_rates {
            currencies.set_rate(code, *rate)?;
        }
        // Reject an unusable default up front
        currencies.get(&config.default_currency)?;

        let registry = Registry::new();
        let metrics = QuoteMetrics::new()?;
        metrics.register(&registry)?;

        Ok(Self {
            engine: Arc::new(engine),
            cache: Arc::new(
                QuoteCache::new(
                    config.cache.max_entries,
                    Duration::from_secs(config.cache.ttl_secs),
                )
                .with_prefix(&config.cache.key_prefix),
            ),
            currencies: Arc::new(currencies),
            metrics,
            registry,
            default_currency: config.default_currency.to_ascii_uppercase(),
        })
    }

    fn fail(&self, err: PricingError) -> ApiError {
        let err = ApiError::from(err);
        self.metrics.record_error(err.kind_label());
        err
    }
}

/// Error body returned by every route
#[derive(Debug)]
pub enum ApiError {
    Pricing(PricingError),
    Internal(String),
}

impl ApiError {
    fn kind_label(&self) -> &'static str {
        match self {
            ApiError::Pricing(err) => match err.kind() {
                ErrorKind::Configuration => "configuration",
                ErrorKind::CyclicDependency => "cyclic_dependency",
                ErrorKind::InvalidInput => "invalid_input",
            },
            ApiError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Pricing(err) => match err.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::Configuration | ErrorKind::CyclicDependency => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError::Pricing(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Pricing(err) => err.to_string(),
            ApiError::Internal(msg) => msg.clone(),
        };
        if status.is_server_error() {
            warn!(error = %message, "Request failed");
        } else {
            debug!(error = %message, "Request rejected");
        }
        let body = serde_json::json!({
            "error": message,
            "kind": self.kind_label(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub selected_feature_ids: BTreeSet<FeatureId>,
    pub user_count: u32,
    #[serde(default)]
    pub billing_period: BillingPeriod,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote_id: Uuid,
    pub breakdown: PriceBreakdown,
    pub currency: String,
    /// Total converted and rounded to the currency's minor unit
    pub total: Decimal,
    pub formatted_total: String,
    /// Period total spread per month, in the response currency
    pub monthly_equivalent: Decimal,
    pub formatted_monthly_equivalent: String,
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub selection: SelectionState,
    pub feature_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub selection: SelectionState,
    pub quote: PriceBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct UpgradesRequest {
    pub selection: SelectionState,
}

#[derive(Debug, Serialize)]
pub struct UpgradesResponse {
    pub current_tier: UserTier,
    pub options: Vec<UpgradeOption>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse<'a> {
    pub features: &'a [Feature],
    pub tiers: &'a [UserTier],
    pub currencies: Vec<&'a str>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/version", get(version))
        .route("/api/v1/catalog", get(catalog))
        .route("/api/v1/quote", post(quote))
        .route("/api/v1/selection/toggle", post(toggle))
        .route("/api/v1/upgrades", post(upgrades))
        .route("/metrics", get(metrics_text))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "crewbill-server",
        "version": crewbill_common::VERSION,
        "description": "Tiered, feature-based subscription pricing",
    }))
}

async fn catalog(State(state): State<AppState>) -> Response {
    let body = CatalogResponse {
        features: state.engine.catalog().features(),
        tiers: state.engine.tiers().tiers(),
        currencies: state.currencies.codes(),
    };
    Json(body).into_response()
}

async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let currency = req
        .currency
        .map(|code| code.to_ascii_uppercase())
        .unwrap_or_else(|| state.default_currency.clone());
    // Fail on an unknown currency before doing any pricing work
    state.currencies.get(&currency).map_err(|e| state.fail(e))?;

    let selection = SelectionState {
        selected_feature_ids: req.selected_feature_ids,
        user_count: req.user_count,
        billing_period: req.billing_period,
    };

    let timer = state.metrics.quote_duration_seconds.start_timer();
    let (breakdown, cached) = state
        .engine
        .quote_cached(&state.cache, &selection)
        .map_err(|e| state.fail(e))?;
    timer.observe_duration();

    state.metrics.quotes_total.inc();
    if cached {
        state.metrics.cache_hits_total.inc();
    }

    let total = state
        .currencies
        .round(breakdown.total, &currency)
        .map_err(|e| state.fail(e))?;
    let formatted_total = state
        .currencies
        .format(breakdown.total, &currency)
        .map_err(|e| state.fail(e))?;

    let monthly_equivalent = state
        .currencies
        .round(breakdown.monthly_equivalent(), &currency)
        .map_err(|e| state.fail(e))?;
    let formatted_monthly_equivalent = state
        .currencies
        .format(breakdown.monthly_equivalent(), &currency)
        .map_err(|e| state.fail(e))?;

    let quote_id = Uuid::now_v7();
    debug!(%quote_id, users = selection.user_count, cached, "Quoted selection");

    Ok(Json(QuoteResponse {
        quote_id,
        breakdown,
        currency,
        total,
        formatted_total,
        monthly_equivalent,
        formatted_monthly_equivalent,
        cached,
    }))
}

async fn toggle(
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let selection = state
        .engine
        .toggle(&req.selection, &req.feature_id)
        .map_err(|e| state.fail(e))?;
    let (quote, _) = state
        .engine
        .quote_cached(&state.cache, &selection)
        .map_err(|e| state.fail(e))?;
    state.metrics.quotes_total.inc();

    Ok(Json(ToggleResponse { selection, quote }))
}

async fn upgrades(
    State(state): State<AppState>,
    Json(req): Json<UpgradesRequest>,
) -> Result<Json<UpgradesResponse>, ApiError> {
    let current_tier = state
        .engine
        .tiers()
        .resolve(req.selection.user_count)
        .map_err(|e| state.fail(e))?
        .clone();
    let options = state
        .engine
        .upgrade_options(&req.selection)
        .map_err(|e| state.fail(e))?;

    Ok(Json(UpgradesResponse {
        current_tier,
        options,
    }))
}

async fn metrics_text(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (content_type, body) =
        metrics::render(&state.registry).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    fn app() -> Router {
        let engine = PricingEngine::builtin().unwrap();
        let state = AppState::new(engine, &ServerConfig::default()).unwrap();
        router(state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn decimal(value: &serde_json::Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_catalog() {
        let request = Request::builder()
            .uri("/api/v1/catalog")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["features"].as_array().unwrap().len(), 14);
        assert_eq!(body["tiers"].as_array().unwrap().len(), 4);
        assert!(body["currencies"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("EUR")));
    }

    #[tokio::test]
    async fn test_quote_yearly() {
        let request = post_json(
            "/api/v1/quote",
            serde_json::json!({
                "selected_feature_ids": ["gps_tracking"],
                "user_count": 25,
                "billing_period": "yearly",
            }),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        // (50 base + 75 GPS) * 12 * 0.8
        assert_eq!(decimal(&body["breakdown"]["total"]), dec!(1200));
        assert_eq!(body["formatted_total"], "$1,200.00");
        assert_eq!(decimal(&body["monthly_equivalent"]), dec!(100));
        assert_eq!(body["formatted_monthly_equivalent"], "$100.00");
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["cached"], false);
        assert!(body["quote_id"].is_string());
    }

    #[tokio::test]
    async fn test_quote_in_other_currency() {
        let request = post_json(
            "/api/v1/quote",
            serde_json::json!({
                "selected_feature_ids": ["api_access"],
                "user_count": 5,
                "currency": "eur",
            }),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currency"], "EUR");
        // 50 USD at 0.92
        assert_eq!(decimal(&body["total"]), dec!(46));
        assert_eq!(body["formatted_total"], "€46.00");
    }

    #[tokio::test]
    async fn test_zero_users_rejected() {
        let request = post_json("/api/v1/quote", serde_json::json!({"user_count": 0}));
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_unknown_feature_rejected() {
        let request = post_json(
            "/api/v1/quote",
            serde_json::json!({"selected_feature_ids": ["teleportation"], "user_count": 3}),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("teleportation"));
    }

    #[tokio::test]
    async fn test_unknown_currency_rejected() {
        let request = post_json(
            "/api/v1/quote",
            serde_json::json!({"user_count": 3, "currency": "XYZ"}),
        );
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_toggle_pulls_dependencies() {
        let request = post_json(
            "/api/v1/selection/toggle",
            serde_json::json!({
                "selection": {"user_count": 20, "billing_period": "monthly"},
                "feature_id": "route_optimization",
            }),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);

        let selected = body["selection"]["selected_feature_ids"].as_array().unwrap();
        assert!(selected.contains(&serde_json::json!("gps_tracking")));
        assert!(selected.contains(&serde_json::json!("route_optimization")));
        // base 40 + GPS 60 + routes 40
        assert_eq!(decimal(&body["quote"]["total"]), dec!(140));
    }

    #[tokio::test]
    async fn test_upgrades() {
        let request = post_json(
            "/api/v1/upgrades",
            serde_json::json!({
                "selection": {
                    "selected_feature_ids": ["gps_tracking"],
                    "user_count": 25,
                    "billing_period": "monthly",
                },
            }),
        );
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_tier"]["name"], "Team");

        let options = body["options"].as_array().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0]["tier"]["name"], "Business");
        assert_eq!(decimal(&options[0]["delta"]), dec!(50));
    }

    #[tokio::test]
    async fn test_metrics_exposed() {
        let app = app();
        let request = post_json("/api/v1/quote", serde_json::json!({"user_count": 3}));
        let (status, _) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("crewbill_quotes_total 1"));
    }

    #[tokio::test]
    async fn test_oversized_catalog_price_returns_error_body() {
        let features = vec![Feature::new(
            "big",
            "Big",
            crewbill_common::FeatureCategory::Integration,
            Decimal::MAX / Decimal::from(10),
            crewbill_common::BillingUnit::PerUser,
        )];
        let engine =
            PricingEngine::new(features, crewbill_engine::pricing::default_tiers()).unwrap();
        let app = router(AppState::new(engine, &ServerConfig::default()).unwrap());

        let request = post_json(
            "/api/v1/quote",
            serde_json::json!({"selected_feature_ids": ["big"], "user_count": 100}),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "configuration");
        assert!(body["error"].as_str().unwrap().contains("overflow"));
    }

    #[test]
    fn test_state_rejects_unknown_default_currency() {
        let config = ServerConfig {
            default_currency: "ZZZ".to_string(),
            ..ServerConfig::default()
        };
        assert!(AppState::new(PricingEngine::builtin().unwrap(), &config).is_err());
    }
}
