use std::sync::Arc;

use serde_json::json;
use shuttle_axum::axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::cache::{AdminAccess, PublishedCache};
use crate::error::PulseError;
use crate::metrics::Metrics;
use crate::pipeline::CycleStatus;
use crate::rate_limit::RateLimiter;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<PublishedCache>,
    pub status: Arc<CycleStatus>,
    pub admin: AdminAccess,
    pub limiter: Arc<RateLimiter>,
    pub allowed_origins: Vec<String>,
    pub metrics: Option<Metrics>,
}

impl AppState {
    pub fn new(cache: Arc<PublishedCache>, status: Arc<CycleStatus>, admin: AdminAccess) -> Self {
        Self {
            cache,
            status,
            admin,
            limiter: Arc::new(RateLimiter::per_minute(100)),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            metrics: None,
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Arc::new(limiter);
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    let metrics = state.metrics.clone();

    let mut app: Router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/trending", get(trending))
        .route("/admin/clear_cache", get(clear_cache))
        .with_state(state);

    if let Some(m) = metrics {
        app = app.merge(m.router());
    }
    app.layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(target: "api", origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

impl IntoResponse for PulseError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            PulseError::MissingCredential => (StatusCode::UNAUTHORIZED, "Missing API Key".to_string()),
            PulseError::Forbidden => (StatusCode::FORBIDDEN, "Invalid API Key".to_string()),
            PulseError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// First hop of `X-Forwarded-For`, else `"unknown"`.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "status": "Pulse backend is running" }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "scraper_alive": state.status.is_alive(),
        "headlines_cached": state.cache.len(),
        "cycle_state": state.status.state(),
        "last_published": state.status.last_published(),
    }))
}

async fn trending(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let client = client_key(&headers);
    if !state.limiter.check(&client) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "detail": "Rate limit exceeded" })),
        )
            .into_response();
    }
    let snapshot = state.cache.snapshot();
    Json(snapshot.as_slice()).into_response()
}

async fn clear_cache(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, PulseError> {
    let Some(value) = headers.get(API_KEY_HEADER) else {
        tracing::warn!(target: "api", "admin request without credential");
        return Err(PulseError::MissingCredential);
    };
    // A non-UTF-8 header can never equal the configured key.
    let credential = value.to_str().map_err(|_| PulseError::Forbidden)?;
    state.admin.clear_cache(&state.cache, credential)?;
    Ok(Json(json!({ "status": "cache cleared" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_uses_first_forwarded_hop() {
        let mut h = HeaderMap::new();
        assert_eq!(client_key(&h), "unknown");
        h.insert("x-forwarded-for", HeaderValue::from_static(" 10.0.0.1 , 192.168.1.1"));
        assert_eq!(client_key(&h), "10.0.0.1");
    }

    #[test]
    fn errors_map_to_status_codes() {
        assert_eq!(PulseError::MissingCredential.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(PulseError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }
}
