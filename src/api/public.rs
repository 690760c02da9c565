use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};

pub struct PublicApi;

impl PublicApi {
    pub async fn landing() -> impl IntoResponse {
        Html("<!DOCTYPE html><html><body><h1>Welcome</h1><a href=\"/dashboard\">Dashboard</a></body></html>")
    }

    /// The login surface itself belongs to the identity provider integration,
    /// the gate only decides who gets to see it.
    pub async fn login_page() -> impl IntoResponse {
        Html("<!DOCTYPE html><html><body><h1>Sign in</h1></body></html>")
    }

    pub async fn fallback() -> impl IntoResponse {
        StatusCode::NOT_FOUND
    }
}
