mod retailers;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use snaploc_engine::{DatasetStats, EngineError, EngineStatus, StoreEngine};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<StoreEngine>,
    pub default_k: usize,
    pub max_k: usize,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    stores_loaded: bool,
    stats: Option<DatasetStats>,
}

#[derive(Debug, Serialize)]
struct IndexData {
    message: &'static str,
    health: &'static str,
    closest_retailers: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_engine_error(request_id: String, error: &EngineError) -> ApiError {
    match error {
        EngineError::NotReady => {
            tracing::warn!(error = %error, "query rejected: retailer data not loaded");
            ApiError::new(request_id, "service_unavailable", "store data not loaded")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/api/v1/health", get(health));

    let query_routes = Router::new()
        .route(
            "/api/v1/retailers/closest",
            get(retailers::closest_retailers),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .merge(public_routes)
        .merge(query_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn index(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: IndexData {
            message: "SNAP Retailer Locator API",
            health: "/api/v1/health",
            closest_retailers:
                "/api/v1/retailers/closest?lat=<lat>&lon=<lon>&k=10 or ?zip_code=<zip>&k=10",
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    let (code, status) = match state.engine.status() {
        EngineStatus::Ready => (StatusCode::OK, "ok"),
        EngineStatus::Pending => (StatusCode::SERVICE_UNAVAILABLE, "loading"),
        EngineStatus::Failed => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    (
        code,
        Json(ApiResponse {
            data: HealthData {
                status,
                stores_loaded: state.engine.is_loaded(),
                stats: state.engine.stats(),
            },
            meta,
        }),
    )
}
