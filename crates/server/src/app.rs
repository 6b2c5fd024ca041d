//! Router assembly.
//!
//! Shared by the server binary and the integration tests, which pass an
//! in-memory session store instead of `PostgreSQL`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::config::HttpConfig;
use crate::middleware::create_session_layer;
use crate::routes::{self, health};
use crate::state::AppState;

/// Build the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
/// * `session_store` - Backing store for sessions
/// * `http` - Session, body limit and CORS settings
pub fn build_router<S>(state: AppState, session_store: S, http: &HttpConfig) -> Router
where
    S: SessionStore + Clone,
{
    let uploads = ServeDir::new(state.storage().root());

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", routes::api_routes())
        .nest_service("/uploads", uploads)
        .layer(create_session_layer(session_store, &http.session))
        .layer(DefaultBodyLimit::max(http.max_upload_bytes));

    let router = match &http.allowed_origin {
        Some(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin.clone())
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        ),
        None => router,
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        #[allow(clippy::cast_possible_truncation)]
                        let latency_ms = latency.as_millis() as u64;
                        span.record("latency_ms", latency_ms);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
