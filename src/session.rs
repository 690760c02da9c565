//! The verified session handed to downstream handlers.
//!
//! A [`Session`] is only ever produced by a
//! [`SessionVerifier`](crate::verify::SessionVerifier). When the gate lets a
//! request through with a session, the session is stored in the request
//! extensions and can be extracted by handlers.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use openidconnect::TokenIntrospectionResponse;
use serde::{Deserialize, Serialize};

use crate::oidc::introspection::SessionIntrospectionResponse;

/// Identity attached to a verified session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub locale: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session carrying only a subject.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            name: None,
            given_name: None,
            family_name: None,
            preferred_username: None,
            email: None,
            email_verified: None,
            locale: None,
            expires_at: None,
        }
    }

    /// Build a session from an active introspection response.
    ///
    /// Returns `None` when the token is inactive or names no subject.
    pub fn from_introspection(response: &SessionIntrospectionResponse) -> Option<Self> {
        if !response.active() {
            return None;
        }
        let user_id = response.sub()?.to_string();
        let claims = response.extra_fields();

        Some(Self {
            user_id,
            username: response.username().map(|s| s.to_string()),
            name: claims.name.clone(),
            given_name: claims.given_name.clone(),
            family_name: claims.family_name.clone(),
            preferred_username: claims.preferred_username.clone(),
            email: claims.email.clone(),
            email_verified: claims.email_verified,
            locale: claims.locale.clone(),
            expires_at: response.exp(),
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
