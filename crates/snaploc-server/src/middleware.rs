use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID of the current request, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug)]
struct Window {
    opened: Instant,
    admitted: usize,
}

/// Fixed-window limiter for the query routes.
///
/// One window is shared by every client; the count resets when the window
/// elapses.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    period: Duration,
    window: Arc<Mutex<Window>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, period: Duration) -> Self {
        Self {
            max_requests,
            period,
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                admitted: 0,
            })),
        }
    }

    #[must_use]
    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Counts one request against the current window. Returns `false` when
    /// the window is already full.
    async fn admit(&self) -> bool {
        let mut window = self.window.lock().await;
        if window.opened.elapsed() >= self.period {
            window.opened = Instant::now();
            window.admitted = 0;
        }
        if window.admitted >= self.max_requests {
            return false;
        }
        window.admitted += 1;
        true
    }
}

/// Uses the caller's `x-request-id` or a fresh `UUIDv4`, exposes it to
/// handlers as [`RequestId`], and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

/// Rejects queries beyond the window limit with `429 rate_limited`.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if rate_limit.admit().await {
        return next.run(req).await;
    }

    tracing::warn!(
        max_requests = rate_limit.max_requests,
        "rate limit exceeded"
    );
    let id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    ApiError::new(id, "rate_limited", "rate limit exceeded").into_response()
}
