//! HTTP application wiring (axum router + shared services).
//!
//! - `services.rs`: storage, session carrier and live hub wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: AppServices, cors_origin: &str) -> Router {
    let sessions = services.sessions.clone();
    let services = Arc::new(services);

    // Identity-gated routes: every request passes the identity resolver.
    let gated = routes::identity_router().layer(axum::middleware::from_fn_with_state(
        sessions,
        middleware::resolve_identity,
    ));

    let router = routes::public_router()
        .merge(gated)
        .layer(Extension(services));

    let router = match cors(cors_origin) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

fn cors(origin: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(origin) {
        Ok(origin) => origin,
        Err(e) => {
            tracing::warn!(%origin, error = %e, "invalid CORS origin; cross-origin requests disabled");
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request()),
    )
}
