use custom_error::custom_error;
use openidconnect::{url, IntrospectionUrl, TokenUrl};
use std::sync::Arc;
use std::time::Duration;

use super::{IntrospectionConfig, IntrospectionVerifier, TokenCookies};
use crate::cookies::CookieOptions;
use crate::oidc::discovery::{discover_endpoints, DiscoveryError};
use crate::oidc::introspection::cache::IntrospectionCache;
use crate::oidc::introspection::AuthorityAuthentication;

custom_error! {
    pub IntrospectionVerifierBuilderError
        NoAuthentication = "no client authentication configured for the authority",
        Discovery{source: DiscoveryError} = "could not fetch discovery document: {source}",
        NoIntrospectionUrl = "discovery document did not contain an introspection url",
        IntrospectionUrl{source: url::ParseError} = "could not parse introspection url: {source}",
        TokenUrl{cause: url::ParseError} = "could not parse token url: {cause}",
}

pub struct IntrospectionVerifierBuilder {
    authority: String,
    authentication: Option<AuthorityAuthentication>,
    introspection_url: Option<String>,
    token_url: Option<String>,
    cookies: TokenCookies,
    cookie_options: CookieOptions,
    timeout: Option<Duration>,
    cache: Option<Box<dyn IntrospectionCache>>,
}

impl IntrospectionVerifierBuilder {
    pub fn new(authority: &str) -> Self {
        Self {
            authority: authority.to_string(),
            authentication: None,
            introspection_url: None,
            token_url: None,
            cookies: TokenCookies::default(),
            cookie_options: CookieOptions::default(),
            timeout: None,
            cache: None,
        }
    }

    pub fn with_basic_auth(mut self, client_id: &str, client_secret: &str) -> Self {
        self.authentication = Some(AuthorityAuthentication::Basic {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        });
        self
    }

    /// Skip discovery for the introspection endpoint.
    pub fn with_introspection_url(mut self, url: &str) -> Self {
        self.introspection_url = Some(url.to_string());
        self
    }

    /// Token endpoint used for the `refresh_token` grant.
    pub fn with_token_url(mut self, url: &str) -> Self {
        self.token_url = Some(url.to_string());
        self
    }

    pub fn with_introspection_cache(mut self, cache: impl IntrospectionCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    pub fn with_cookie_names(mut self, access_token: &str, refresh_token: &str) -> Self {
        self.cookies = TokenCookies {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        };
        self
    }

    /// Attributes for the token cookies this verifier writes.
    pub fn with_cookie_options(mut self, options: CookieOptions) -> Self {
        self.cookie_options = options;
        self
    }

    /// Upper bound for one verification, refresh included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve endpoints, discovering the missing ones from the authority.
    ///
    /// A missing introspection endpoint is fatal. A missing token endpoint
    /// only disables refreshing.
    pub async fn build(self) -> Result<IntrospectionVerifier, IntrospectionVerifierBuilderError> {
        let authentication = self
            .authentication
            .ok_or(IntrospectionVerifierBuilderError::NoAuthentication)?;

        let explicit_token = self
            .token_url
            .map(TokenUrl::new)
            .transpose()
            .map_err(|cause| IntrospectionVerifierBuilderError::TokenUrl { cause })?;

        let (introspection_uri, token_uri) = match self.introspection_url {
            Some(introspection) => {
                let introspection = IntrospectionUrl::new(introspection)
                    .map_err(|source| IntrospectionVerifierBuilderError::IntrospectionUrl { source })?;
                let token = match explicit_token {
                    Some(token) => Some(token),
                    // Refresh is optional, an authority without metadata still verifies
                    None => match discover_endpoints(&self.authority).await {
                        Ok(discovered) => discovered.token,
                        Err(err) => {
                            tracing::debug!(error = %err, "no token endpoint, sessions will not be refreshed");
                            None
                        }
                    },
                };
                (introspection, token)
            }
            None => {
                let discovered = discover_endpoints(&self.authority)
                    .await
                    .map_err(|source| IntrospectionVerifierBuilderError::Discovery { source })?;
                let introspection = discovered
                    .introspection
                    .ok_or(IntrospectionVerifierBuilderError::NoIntrospectionUrl)?;
                (introspection, explicit_token.or(discovered.token))
            }
        };

        Ok(IntrospectionVerifier {
            config: Arc::new(IntrospectionConfig {
                authority: self.authority,
                authentication,
                introspection_uri,
                token_uri,
                cookies: self.cookies,
                cookie_options: self.cookie_options,
                timeout: self.timeout,
                cache: self.cache,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::all)]

    use super::*;
    use crate::testing::MockAuthority;
    use crate::verify::SessionVerifier;

    #[tokio::test]
    async fn builds_with_explicit_endpoints() {
        let verifier = IntrospectionVerifierBuilder::new("https://auth.example.com")
            .with_basic_auth("client", "secret")
            .with_introspection_url("https://auth.example.com/oauth/v2/introspect")
            .with_token_url("https://auth.example.com/oauth/v2/token")
            .with_cookie_names("sb-access", "sb-refresh")
            .build()
            .await
            .unwrap();

        assert_eq!(
            verifier.config.introspection_uri.as_str(),
            "https://auth.example.com/oauth/v2/introspect"
        );
        assert!(verifier.config.token_uri.is_some());
        assert_eq!(verifier.config.cookies.access_token, "sb-access");
        assert_eq!(verifier.config.authority, "https://auth.example.com");
    }

    #[tokio::test]
    async fn requires_authentication() {
        let result = IntrospectionVerifierBuilder::new("https://auth.example.com")
            .with_introspection_url("https://auth.example.com/oauth/v2/introspect")
            .build()
            .await;

        assert!(matches!(
            result.unwrap_err(),
            IntrospectionVerifierBuilderError::NoAuthentication
        ));
    }

    #[tokio::test]
    async fn rejects_malformed_urls() {
        let result = IntrospectionVerifierBuilder::new("https://auth.example.com")
            .with_basic_auth("client", "secret")
            .with_introspection_url("not a url")
            .build()
            .await;

        assert!(matches!(
            result.unwrap_err(),
            IntrospectionVerifierBuilderError::IntrospectionUrl { .. }
        ));
    }

    #[tokio::test]
    async fn discovers_missing_endpoints() {
        let authority = MockAuthority::start().await;

        let verifier = IntrospectionVerifierBuilder::new(&authority.base_url())
            .with_basic_auth(MockAuthority::CLIENT_ID, MockAuthority::CLIENT_SECRET)
            .build()
            .await
            .unwrap();

        assert_eq!(
            verifier.config.introspection_uri.as_str(),
            authority.introspection_url()
        );
        assert_eq!(
            verifier.config.token_uri.as_ref().unwrap().as_str(),
            authority.token_url()
        );
    }

    #[tokio::test]
    async fn explicit_token_url_wins_over_discovery() {
        let authority = MockAuthority::start().await;

        let verifier = IntrospectionVerifierBuilder::new(&authority.base_url())
            .with_basic_auth(MockAuthority::CLIENT_ID, MockAuthority::CLIENT_SECRET)
            .with_token_url("https://tokens.example.com/oauth/v2/token")
            .build()
            .await
            .unwrap();

        assert_eq!(
            verifier.config.introspection_uri.as_str(),
            authority.introspection_url()
        );
        assert_eq!(
            verifier.config.token_uri.as_ref().unwrap().as_str(),
            "https://tokens.example.com/oauth/v2/token"
        );
    }

    #[tokio::test]
    async fn token_url_falls_back_to_discovery() {
        let authority = MockAuthority::start().await;

        let verifier = IntrospectionVerifierBuilder::new(&authority.base_url())
            .with_basic_auth(MockAuthority::CLIENT_ID, MockAuthority::CLIENT_SECRET)
            .with_introspection_url(&authority.introspection_url())
            .build()
            .await
            .unwrap();

        assert_eq!(
            verifier.config.token_uri.as_ref().unwrap().as_str(),
            authority.token_url()
        );
    }

    #[tokio::test]
    async fn discovered_verifier_refreshes_sessions() {
        let authority = MockAuthority::start().await;
        let verifier = IntrospectionVerifierBuilder::new(&authority.base_url())
            .with_basic_auth(MockAuthority::CLIENT_ID, MockAuthority::CLIENT_SECRET)
            .build()
            .await
            .unwrap();
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            http::HeaderValue::from_str(&format!(
                "refresh_token={}",
                MockAuthority::REFRESH_TOKEN
            ))
            .unwrap(),
        );

        let verification = verifier
            .verify(&crate::cookies::RequestCookies::from_headers(&headers))
            .await;

        assert!(verification.result.unwrap().is_some());
        assert_eq!(authority.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn missing_introspection_endpoint_is_an_error() {
        let authority = MockAuthority::without_introspection().await;

        let result = IntrospectionVerifierBuilder::new(&authority.base_url())
            .with_basic_auth(MockAuthority::CLIENT_ID, MockAuthority::CLIENT_SECRET)
            .build()
            .await;

        assert!(matches!(
            result.unwrap_err(),
            IntrospectionVerifierBuilderError::NoIntrospectionUrl
        ));
    }

    #[test]
    fn parse_errors_convert_to_introspection_url_variant() {
        let err: IntrospectionVerifierBuilderError = url::Url::parse("::").unwrap_err().into();

        assert!(matches!(
            err,
            IntrospectionVerifierBuilderError::IntrospectionUrl { .. }
        ));
    }

    #[tokio::test]
    async fn rejects_malformed_token_url() {
        let result = IntrospectionVerifierBuilder::new("https://auth.example.com")
            .with_basic_auth("client", "secret")
            .with_introspection_url("https://auth.example.com/oauth/v2/introspect")
            .with_token_url("::")
            .build()
            .await;

        assert!(matches!(
            result.unwrap_err(),
            IntrospectionVerifierBuilderError::TokenUrl { .. }
        ));
    }

    #[tokio::test]
    async fn unreachable_metadata_leaves_refresh_disabled() {
        let verifier = IntrospectionVerifierBuilder::new("http://127.0.0.1:9")
            .with_basic_auth("client", "secret")
            .with_introspection_url("http://127.0.0.1:9/oauth/v2/introspect")
            .build()
            .await
            .unwrap();

        assert!(verifier.config.token_uri.is_none());
    }

    #[tokio::test]
    async fn discovery_errors_surface() {
        let result = IntrospectionVerifierBuilder::new("foobar")
            .with_basic_auth("client", "secret")
            .build()
            .await;

        assert!(matches!(
            result.unwrap_err(),
            IntrospectionVerifierBuilderError::Discovery { .. }
        ));
    }
}
