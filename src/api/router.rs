//! Routing configuration for the application.
//!
//! This module wires the demo handlers and the session gate together with
//! the surrounding tower middleware.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::api::authenticated::AuthenticatedApi;
use crate::api::public::PublicApi;
use crate::gate::{session_gate, SessionGate};
use crate::routes::RouteClass;

/// Create a router with every route behind the given gate
///
/// # Arguments
///
/// * `gate` - The session gate deciding who reaches which route
///
/// # Returns
///
/// A configured router
pub fn create_router(gate: Arc<SessionGate>) -> Router {
    let protected_root = gate
        .routes()
        .rules()
        .iter()
        .find(|rule| rule.classification == RouteClass::Protected)
        .map(|rule| rule.pattern.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "/dashboard".to_string());
    let login_path = gate.targets().login.clone();

    let mut router = Router::new()
        .route("/", get(PublicApi::landing))
        .route(&login_path, get(PublicApi::login_page))
        .route(&format!("{}/*page", protected_root), get(AuthenticatedApi::page));

    // A protected root of `/` shares its index with the landing page
    if !protected_root.is_empty() {
        router = router.route(&protected_root, get(AuthenticatedApi::dashboard));
    }

    router
        .fallback(PublicApi::fallback)
        .layer(axum::middleware::from_fn_with_state(gate, session_gate))
        .layer(PropagateHeaderLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(TraceLayer::new_for_http())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]))
}
