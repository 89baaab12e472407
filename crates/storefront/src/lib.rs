//! Keepsake storefront.
//!
//! HTTP surface over the customization engine in `keepsake-core`: product
//! options, live quotes, and one stateful customization flow per customer
//! that ends in an order handed to the order-intake service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod flow;
pub mod intake;
pub mod messaging;
pub mod middleware;
pub mod products;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::{Router, http::Request, http::Response, middleware::from_fn, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Build the application router.
///
/// Sentry layers are added by the binary so tests can drive the router
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    let api = routes::api_routes(&state);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
