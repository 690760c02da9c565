//! Session verification against an OAuth 2.0 authority.
//!
//! Sessions live in two cookies: a short-lived access token checked through
//! token introspection, and a refresh token used to mint a new access token
//! once the old one stops being active. Refreshing rotates the cookies, which
//! is reported back to the gate as cookie instructions.

mod builder;

pub use builder::{IntrospectionVerifierBuilder, IntrospectionVerifierBuilderError};

use async_trait::async_trait;
use openidconnect::{IntrospectionUrl, TokenIntrospectionResponse, TokenUrl};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cookies::{CookieInstruction, CookieOptions, RequestCookies};
use crate::error::VerificationError;
use crate::oidc::introspection::cache::IntrospectionCache;
use crate::oidc::introspection::{
    introspect, refresh, AuthorityAuthentication, IntrospectionError, RefreshedTokens,
    SessionIntrospectionResponse,
};
use crate::session::Session;
use crate::verify::{SessionVerifier, Verification};

/// Names of the cookies holding the session tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenCookies {
    pub access_token: String,
    pub refresh_token: String,
}

impl Default for TokenCookies {
    fn default() -> Self {
        Self {
            access_token: "access_token".to_string(),
            refresh_token: "refresh_token".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IntrospectionVerifier {
    pub(crate) config: Arc<IntrospectionConfig>,
}

#[derive(Debug)]
pub(crate) struct IntrospectionConfig {
    pub(crate) authority: String,
    pub(crate) authentication: AuthorityAuthentication,
    pub(crate) introspection_uri: IntrospectionUrl,
    pub(crate) token_uri: Option<TokenUrl>,
    pub(crate) cookies: TokenCookies,
    pub(crate) cookie_options: CookieOptions,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cache: Option<Box<dyn IntrospectionCache>>,
}

impl IntrospectionVerifier {
    pub fn builder(authority: &str) -> IntrospectionVerifierBuilder {
        IntrospectionVerifierBuilder::new(authority)
    }

    async fn check(&self, cookies: &RequestCookies, deadline: Option<Instant>) -> Verification {
        let config = &self.config;
        let access_token = cookies.get(&config.cookies.access_token);
        let refresh_token = cookies.get(&config.cookies.refresh_token);

        if let Some(token) = access_token {
            match within(deadline, self.introspect_cached(token)).await {
                Err(Elapsed) => return Verification::failed(VerificationError::Timeout),
                Ok(Ok(response)) if response.active() => {
                    return Verification::new(Ok(Session::from_introspection(&response)));
                }
                Ok(Ok(_)) => tracing::debug!("access token is no longer active"),
                Ok(Err(source)) => {
                    return Verification::failed(VerificationError::Introspection { source })
                }
            }
        }

        match (refresh_token, config.token_uri.as_ref()) {
            (Some(refresh_token), Some(token_uri)) => {
                self.refresh_session(token_uri, refresh_token, access_token, deadline)
                    .await
            }
            _ if access_token.is_some() => Verification::anonymous().with_cookie(
                CookieInstruction::removal(&config.cookies.access_token, &config.cookie_options),
            ),
            _ => Verification::anonymous(),
        }
    }

    async fn introspect_cached(
        &self,
        token: &str,
    ) -> Result<SessionIntrospectionResponse, IntrospectionError> {
        let config = &self.config;

        if let Some(cache) = config.cache.as_deref() {
            if let Some(cached) = cache.get(token).await {
                return Ok(cached);
            }
        }

        let response = introspect(
            config.introspection_uri.as_str(),
            &config.authentication,
            token,
        )
        .await?;

        if let Some(cache) = config.cache.as_deref() {
            cache.set(token, response.clone()).await;
        }

        Ok(response)
    }

    /// Once the authority has rotated the tokens the old refresh token is
    /// spent, so the rotated cookies are returned whatever happens next.
    async fn refresh_session(
        &self,
        token_uri: &TokenUrl,
        refresh_token: &str,
        stale_access_token: Option<&str>,
        deadline: Option<Instant>,
    ) -> Verification {
        let config = &self.config;

        let grant = refresh(token_uri.as_str(), &config.authentication, refresh_token);
        let tokens = match within(deadline, grant).await {
            Err(Elapsed) => return Verification::failed(VerificationError::Timeout),
            Ok(Ok(Some(tokens))) => tokens,
            Ok(Ok(None)) => {
                tracing::debug!(authority = %config.authority, "refresh token was rejected");
                if let (Some(cache), Some(stale)) = (config.cache.as_deref(), stale_access_token) {
                    cache.remove(stale).await;
                }
                return Verification::anonymous().with_cookies(self.clear_cookies());
            }
            Ok(Err(cause)) => return Verification::failed(VerificationError::Refresh { cause }),
        };

        let rotated = self.token_cookies(&tokens);
        let verification = match within(deadline, self.introspect_cached(&tokens.access_token)).await
        {
            Ok(Ok(response)) => Verification::new(Ok(Session::from_introspection(&response))),
            Ok(Err(source)) => Verification::failed(VerificationError::Introspection { source }),
            Err(Elapsed) => Verification::failed(VerificationError::Timeout),
        };

        verification.with_cookies(rotated)
    }

    fn token_cookies(&self, tokens: &RefreshedTokens) -> Vec<CookieInstruction> {
        let config = &self.config;

        let mut access_options = config.cookie_options.clone();
        if let Some(expires_in) = tokens.expires_in {
            let seconds = i64::try_from(expires_in).unwrap_or(i64::MAX);
            access_options = access_options.with_max_age(time::Duration::seconds(seconds));
        }

        let mut instructions = vec![CookieInstruction::new(
            &config.cookies.access_token,
            &tokens.access_token,
            access_options,
        )];

        if let Some(refresh_token) = &tokens.refresh_token {
            instructions.push(CookieInstruction::new(
                &config.cookies.refresh_token,
                refresh_token,
                config.cookie_options.clone(),
            ));
        }

        instructions
    }

    fn clear_cookies(&self) -> Vec<CookieInstruction> {
        let config = &self.config;

        vec![
            CookieInstruction::removal(&config.cookies.access_token, &config.cookie_options),
            CookieInstruction::removal(&config.cookies.refresh_token, &config.cookie_options),
        ]
    }
}

/// Marker for a step that ran past the verification deadline.
struct Elapsed;

async fn within<F: Future>(deadline: Option<Instant>, step: F) -> Result<F::Output, Elapsed> {
    match deadline {
        None => Ok(step.await),
        Some(deadline) => tokio::time::timeout_at(deadline, step)
            .await
            .map_err(|_| Elapsed),
    }
}

#[async_trait]
impl SessionVerifier for IntrospectionVerifier {
    async fn verify(&self, cookies: &RequestCookies) -> Verification {
        let deadline = self.config.timeout.map(|limit| Instant::now() + limit);
        self.check(cookies, deadline).await
    }
}
