//! Cookie instructions and the in-flight request cookie set.
//!
//! A [`CookieInstruction`] is produced by the session verifier whenever it
//! refreshes or revokes credentials. The gate mirrors every instruction onto
//! the request ([`RequestCookies::apply`]) and onto the response
//! ([`append_set_cookies`]).

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue};
use time::Duration;
use tower_cookies::cookie::{Cookie, SameSite};

/// Attributes written alongside a cookie value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<Duration>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age: None,
            http_only: true,
            secure: true,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl CookieOptions {
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// A cookie to set on the outgoing response (and mirror onto the request).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieInstruction {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
    removal: bool,
}

impl CookieInstruction {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
            removal: false,
        }
    }

    /// Instruction that expires the named cookie on the client.
    pub fn removal(name: impl Into<String>, options: &CookieOptions) -> Self {
        Self {
            removal: true,
            ..Self::new(name, "", options.clone().with_max_age(Duration::ZERO))
        }
    }

    /// Only instructions built with [`CookieInstruction::removal`] delete the
    /// cookie. A zero max-age on a set instruction still carries its value.
    pub fn is_removal(&self) -> bool {
        self.removal
    }

    pub fn to_cookie(&self) -> Cookie<'static> {
        let options = &self.options;
        let mut builder = Cookie::build((self.name.clone(), self.value.clone()))
            .http_only(options.http_only)
            .secure(options.secure);

        if let Some(path) = &options.path {
            builder = builder.path(path.clone());
        }
        if let Some(domain) = &options.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(max_age) = options.max_age {
            builder = builder.max_age(max_age);
        }
        if let Some(same_site) = options.same_site {
            builder = builder.same_site(same_site);
        }

        builder.build()
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.to_cookie().to_string()).ok()
    }
}

/// The name/value pairs a request carries, in the order they were sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestCookies {
    entries: Vec<(String, String)>,
}

impl RequestCookies {
    /// Collect cookies from every `Cookie` header. Unparseable pairs are dropped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let entries = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect();

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set or remove a cookie the way the client will after the response.
    ///
    /// Duplicates of the name collapse into one entry at the position of the
    /// first occurrence.
    pub fn apply(&mut self, instruction: &CookieInstruction) {
        let first = self
            .entries
            .iter()
            .position(|(name, _)| name == &instruction.name);
        self.entries.retain(|(name, _)| name != &instruction.name);

        if instruction.is_removal() {
            return;
        }

        let entry = (instruction.name.clone(), instruction.value.clone());
        match first {
            Some(index) => self.entries.insert(index, entry),
            None => self.entries.push(entry),
        }
    }

    /// Replace the `Cookie` headers with a single header holding this set.
    pub fn write_to(&self, headers: &mut HeaderMap) {
        headers.remove(COOKIE);

        if self.entries.is_empty() {
            return;
        }

        let joined = self
            .entries
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        match HeaderValue::from_str(&joined) {
            Ok(value) => {
                headers.insert(COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "could not rewrite request cookie header"),
        }
    }
}

/// Append one `Set-Cookie` header per instruction.
pub fn append_set_cookies(headers: &mut HeaderMap, instructions: &[CookieInstruction]) {
    for instruction in instructions {
        match instruction.to_header_value() {
            Some(value) => {
                headers.append(SET_COOKIE, value);
            }
            None => tracing::warn!(cookie = %instruction.name, "skipping cookie that is not a valid header value"),
        }
    }
}
