use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use crate::api::router;
use crate::gate::{RedirectTargets, SessionGate};
use crate::routes::RouteTable;
use crate::verify::SessionVerifier;

// Helper function to create a test app behind the default routes
fn test_app(verifier: impl SessionVerifier + 'static) -> Router {
    router::create_router(Arc::new(test_gate(verifier)))
}

fn test_gate(verifier: impl SessionVerifier + 'static) -> SessionGate {
    SessionGate::new(RouteTable::default(), RedirectTargets::default(), verifier)
}

// Helper function to make a test request
async fn make_request(
    app: Router,
    uri: &str,
    headers: Option<Vec<(&str, String)>>,
) -> (StatusCode, Vec<(String, String)>, String) {
    let mut req_builder = Request::builder().method(http::Method::GET).uri(uri);

    if let Some(headers) = headers {
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }
    }

    let req = req_builder.body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();

    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
        .collect();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();

    (status, headers, body)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn set_cookies(headers: &[(String, String)]) -> Vec<&str> {
    headers
        .iter()
        .filter(|(key, _)| key == "set-cookie")
        .map(|(_, value)| value.as_str())
        .collect()
}
