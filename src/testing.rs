//! Test doubles: a local stand-in for the OAuth 2.0 authority and a verifier
//! with a fixed outcome.

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::Engine;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cookies::RequestCookies;
use crate::oidc::introspection::AuthorityAuthentication;
use crate::oidc::verifier::IntrospectionVerifierBuilder;
use crate::verify::{SessionVerifier, Verification};

#[derive(Clone, Default)]
struct Counters {
    introspections: Arc<AtomicUsize>,
    refreshes: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct AuthorityState {
    issuer: String,
    advertise_introspection: bool,
    counters: Counters,
}

pub(crate) struct MockAuthority {
    addr: SocketAddr,
    counters: Counters,
}

impl MockAuthority {
    pub const CLIENT_ID: &'static str = "gate-client";
    pub const CLIENT_SECRET: &'static str = "gate-secret";
    pub const USER_ID: &'static str = "user-1";
    pub const VALID_TOKEN: &'static str = "valid-token";
    pub const SLOW_TOKEN: &'static str = "slow-token";
    pub const REFRESH_TOKEN: &'static str = "good-refresh";
    /// Refreshes instantly into [`Self::SLOW_TOKEN`].
    pub const SLOW_REFRESH_TOKEN: &'static str = "slow-refresh";
    pub const REFRESHED_TOKEN: &'static str = "fresh-token";
    pub const ROTATED_REFRESH_TOKEN: &'static str = "rotated-refresh";

    pub async fn start() -> Self {
        Self::start_with(true).await
    }

    /// An authority whose discovery document omits the introspection endpoint.
    pub async fn without_introspection() -> Self {
        Self::start_with(false).await
    }

    async fn start_with(advertise_introspection: bool) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let counters = Counters::default();
        let state = AuthorityState {
            issuer: format!("http://{}", addr),
            advertise_introspection,
            counters: counters.clone(),
        };
        let router = Router::new()
            .route("/.well-known/openid-configuration", get(configuration))
            .route("/oauth/v2/keys", get(keys))
            .route("/oauth/v2/introspect", post(introspect))
            .route("/oauth/v2/token", post(token))
            .with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, counters }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn introspection_url(&self) -> String {
        format!("{}/oauth/v2/introspect", self.base_url())
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/v2/token", self.base_url())
    }

    pub fn authentication(&self) -> AuthorityAuthentication {
        AuthorityAuthentication::Basic {
            client_id: Self::CLIENT_ID.to_string(),
            client_secret: Self::CLIENT_SECRET.to_string(),
        }
    }

    pub fn verifier_builder(&self) -> IntrospectionVerifierBuilder {
        IntrospectionVerifierBuilder::new(&self.base_url())
            .with_basic_auth(Self::CLIENT_ID, Self::CLIENT_SECRET)
            .with_introspection_url(&self.introspection_url())
            .with_token_url(&self.token_url())
    }

    pub fn introspection_calls(&self) -> usize {
        self.counters.introspections.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.counters.refreshes.load(Ordering::SeqCst)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            MockAuthority::CLIENT_ID,
            MockAuthority::CLIENT_SECRET
        ))
    );

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == expected)
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid_client" })),
    )
        .into_response()
}

async fn configuration(State(state): State<AuthorityState>) -> Response {
    let issuer = &state.issuer;
    let mut document = json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{}/oauth/v2/authorize", issuer),
        "token_endpoint": format!("{}/oauth/v2/token", issuer),
        "jwks_uri": format!("{}/oauth/v2/keys", issuer),
        "response_types_supported": ["code"],
        "subject_types_supported": ["public"],
        "id_token_signing_alg_values_supported": ["RS256"],
    });
    if state.advertise_introspection {
        document["introspection_endpoint"] = json!(format!("{}/oauth/v2/introspect", issuer));
    }

    Json(document).into_response()
}

async fn keys() -> Response {
    Json(json!({ "keys": [] })).into_response()
}

async fn introspect(
    State(AuthorityState { counters, .. }): State<AuthorityState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    counters.introspections.fetch_add(1, Ordering::SeqCst);

    let token = form.get("token").map(String::as_str).unwrap_or_default();
    if token == MockAuthority::SLOW_TOKEN {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    match token {
        MockAuthority::VALID_TOKEN | MockAuthority::REFRESHED_TOKEN | MockAuthority::SLOW_TOKEN => {
            Json(json!({
                "active": true,
                "sub": MockAuthority::USER_ID,
                "username": "ada",
                "email": "ada@example.com",
                "email_verified": true,
                "exp": chrono::Utc::now().timestamp() + 600,
            }))
            .into_response()
        }
        _ => Json(json!({ "active": false })).into_response(),
    }
}

async fn token(
    State(AuthorityState { counters, .. }): State<AuthorityState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    counters.refreshes.fetch_add(1, Ordering::SeqCst);

    let grant = form.get("grant_type").map(String::as_str);
    let refresh_token = form.get("refresh_token").map(String::as_str);

    match (grant, refresh_token) {
        (Some("refresh_token"), Some(MockAuthority::REFRESH_TOKEN)) => Json(json!({
            "access_token": MockAuthority::REFRESHED_TOKEN,
            "refresh_token": MockAuthority::ROTATED_REFRESH_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600,
        }))
        .into_response(),
        (Some("refresh_token"), Some(MockAuthority::SLOW_REFRESH_TOKEN)) => Json(json!({
            "access_token": MockAuthority::SLOW_TOKEN,
            "refresh_token": MockAuthority::ROTATED_REFRESH_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3600,
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response(),
    }
}

/// Verifier returning the same outcome every time and counting calls.
#[derive(Debug)]
pub(crate) struct FixedVerifier {
    outcome: fn() -> Verification,
    calls: AtomicUsize,
}

impl FixedVerifier {
    pub fn new(outcome: fn() -> Verification) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionVerifier for FixedVerifier {
    async fn verify(&self, _cookies: &RequestCookies) -> Verification {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}
