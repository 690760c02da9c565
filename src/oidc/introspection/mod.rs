use base64::Engine;
use custom_error::custom_error;
use openidconnect::http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use openidconnect::http::Method;
use openidconnect::reqwest::async_http_client;
use openidconnect::url::{ParseError, Url};
use openidconnect::{
    core::CoreTokenType, ExtraTokenFields, HttpRequest, HttpResponse,
    StandardTokenIntrospectionResponse,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display};

pub mod cache;

custom_error! {
    pub IntrospectionError
        RequestFailed{source: openidconnect::reqwest::Error<reqwest::Error>} = "the request to the authority did fail: {source}",
        PayloadSerialization = "could not correctly serialize request payload",
        InvalidCredentials = "client credentials cannot be sent as a header",
        ParseUrl{source: ParseError} = "could not parse url: {source}",
        ParseResponse{source: serde_json::Error} = "could not parse authority response: {source}",
        ResponseError{source: AuthorityResponseError} = "received error response from authority: {source}",
}

/// Profile claims returned next to the standard introspection fields.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SessionClaims {
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub locale: Option<String>,
}

impl ExtraTokenFields for SessionClaims {}

pub type SessionIntrospectionResponse =
    StandardTokenIntrospectionResponse<SessionClaims, CoreTokenType>;

/// Tokens issued by a successful `refresh_token` grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum AuthorityAuthentication {
    Basic {
        client_id: String,
        client_secret: String,
    },
}

fn headers(auth: &AuthorityAuthentication) -> Result<HeaderMap, IntrospectionError> {
    let mut headers = HeaderMap::new();
    headers.append(ACCEPT, HeaderValue::from_static("application/json"));
    headers.append(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );

    match auth {
        AuthorityAuthentication::Basic {
            client_id,
            client_secret,
        } => {
            let credentials = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", client_id, client_secret));
            let value = HeaderValue::from_str(&format!("Basic {}", credentials))
                .map_err(|_| IntrospectionError::InvalidCredentials)?;
            headers.append(AUTHORIZATION, value);
            Ok(headers)
        }
    }
}

async fn post_form(
    endpoint: &str,
    authentication: &AuthorityAuthentication,
    form: &[(&str, &str)],
) -> Result<HttpResponse, IntrospectionError> {
    let body =
        serde_urlencoded::to_string(form).map_err(|_| IntrospectionError::PayloadSerialization)?;

    async_http_client(HttpRequest {
        url: Url::parse(endpoint).map_err(|source| IntrospectionError::ParseUrl { source })?,
        method: Method::POST,
        headers: headers(authentication)?,
        body: body.into_bytes(),
    })
    .await
    .map_err(|source| IntrospectionError::RequestFailed { source })
}

/// Ask the authority whether `token` is active (RFC 7662).
pub async fn introspect(
    introspection_uri: &str,
    authentication: &AuthorityAuthentication,
    token: &str,
) -> Result<SessionIntrospectionResponse, IntrospectionError> {
    let response = post_form(introspection_uri, authentication, &[("token", token)]).await?;

    if !response.status_code.is_success() {
        return Err(IntrospectionError::ResponseError {
            source: AuthorityResponseError::from_response(&response),
        });
    }

    serde_json::from_slice(response.body.as_slice())
        .map_err(|source| IntrospectionError::ParseResponse { source })
}

/// Exchange a refresh token for new tokens.
///
/// `Ok(None)` means the authority rejected the grant (400/401), i.e. the
/// refresh token is no longer usable.
pub async fn refresh(
    token_uri: &str,
    authentication: &AuthorityAuthentication,
    refresh_token: &str,
) -> Result<Option<RefreshedTokens>, IntrospectionError> {
    let response = post_form(
        token_uri,
        authentication,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
    .await?;

    match response.status_code.as_u16() {
        400 | 401 => return Ok(None),
        _ if !response.status_code.is_success() => {
            return Err(IntrospectionError::ResponseError {
                source: AuthorityResponseError::from_response(&response),
            })
        }
        _ => {}
    }

    serde_json::from_slice(response.body.as_slice())
        .map(Some)
        .map_err(|source| IntrospectionError::ParseResponse { source })
}

#[derive(Debug)]
pub struct AuthorityResponseError {
    status_code: String,
    body: String,
}

impl AuthorityResponseError {
    fn from_response(response: &HttpResponse) -> Self {
        Self {
            status_code: response.status_code.to_string(),
            body: String::from_utf8_lossy(response.body.as_slice()).to_string(),
        }
    }
}

impl Display for AuthorityResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status code: {}, body: {}", self.status_code, self.body)
    }
}

impl Error for AuthorityResponseError {}
