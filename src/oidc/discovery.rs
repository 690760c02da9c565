//! Endpoint discovery through the authority's OpenID Connect metadata.
//!
//! The verifier needs two endpoints: introspection for checking access
//! tokens and token for the `refresh_token` grant. Whatever is not configured
//! explicitly is read from `/.well-known/openid-configuration`.

use custom_error::custom_error;
use openidconnect::reqwest::async_http_client;
use openidconnect::{
    core::{
        CoreAuthDisplay, CoreClaimName, CoreClaimType, CoreClientAuthMethod, CoreGrantType,
        CoreJsonWebKey, CoreJsonWebKeyType, CoreJsonWebKeyUse, CoreJweContentEncryptionAlgorithm,
        CoreJweKeyManagementAlgorithm, CoreJwsSigningAlgorithm, CoreResponseMode, CoreResponseType,
        CoreSubjectIdentifierType,
    },
    url, AdditionalProviderMetadata, IntrospectionUrl, IssuerUrl, ProviderMetadata, RevocationUrl,
    TokenUrl,
};
use serde::{Deserialize, Serialize};

custom_error! {
    pub DiscoveryError
        IssuerUrl{source: url::ParseError} = "could not parse issuer url: {source}",
        DiscoveryDocument = "could not discover OIDC document",
}

/// The endpoints an authority advertises for session verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityEndpoints {
    pub introspection: Option<IntrospectionUrl>,
    pub token: Option<TokenUrl>,
    pub revocation: Option<RevocationUrl>,
}

impl From<&AuthorityProviderMetadata> for AuthorityEndpoints {
    fn from(metadata: &AuthorityProviderMetadata) -> Self {
        let extra = metadata.additional_metadata();

        Self {
            introspection: extra.introspection_endpoint.clone(),
            token: metadata.token_endpoint().cloned(),
            revocation: extra.revocation_endpoint.clone(),
        }
    }
}

/// Fetch the authority's metadata and pick out its verification endpoints.
pub async fn discover_endpoints(authority: &str) -> Result<AuthorityEndpoints, DiscoveryError> {
    let metadata = discover(authority).await?;
    let endpoints = AuthorityEndpoints::from(&metadata);

    tracing::debug!(
        authority,
        introspection = endpoints.introspection.as_ref().map(|url| url.as_str()),
        token = endpoints.token.as_ref().map(|url| url.as_str()),
        "discovered authority endpoints"
    );

    Ok(endpoints)
}

/// Fetch the authority's OpenID Connect discovery document.
///
/// A trailing `/` on the authority is ignored, the issuer in the document
/// has to match the trimmed form.
pub async fn discover(authority: &str) -> Result<AuthorityProviderMetadata, DiscoveryError> {
    let issuer = IssuerUrl::new(authority.trim_end_matches('/').to_string())
        .map_err(|source| DiscoveryError::IssuerUrl { source })?;

    AuthorityProviderMetadata::discover_async(issuer, async_http_client)
        .await
        .map_err(|err| {
            tracing::debug!(error = %err, authority, "discovery failed");
            DiscoveryError::DiscoveryDocument
        })
}

/// RFC 8414 fields the core OpenID Connect metadata leaves out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorityAdditionalMetadata {
    pub introspection_endpoint: Option<IntrospectionUrl>,
    pub revocation_endpoint: Option<RevocationUrl>,
}

impl AdditionalProviderMetadata for AuthorityAdditionalMetadata {}

pub type AuthorityProviderMetadata = ProviderMetadata<
    AuthorityAdditionalMetadata,
    CoreAuthDisplay,
    CoreClientAuthMethod,
    CoreClaimName,
    CoreClaimType,
    CoreGrantType,
    CoreJweContentEncryptionAlgorithm,
    CoreJweKeyManagementAlgorithm,
    CoreJwsSigningAlgorithm,
    CoreJsonWebKeyType,
    CoreJsonWebKeyUse,
    CoreJsonWebKey,
    CoreResponseMode,
    CoreResponseType,
    CoreSubjectIdentifierType,
>;
