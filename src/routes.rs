//! Route classification.
//!
//! Every request path is classified before any session work happens. The
//! classification is a pure function of the path and the configured rules.

use serde::{Deserialize, Serialize};

/// How the gate treats a request path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteClass {
    /// Bypasses the gate entirely, no verification call.
    Public,
    /// Requires a verified session.
    Protected,
    /// The login surface, hidden from callers that already have a session.
    AuthEntry,
}

/// A single `{pattern, classification}` entry of the route configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub pattern: String,
    pub classification: RouteClass,
}

impl RouteRule {
    pub fn new(pattern: impl Into<String>, classification: RouteClass) -> Self {
        Self {
            pattern: pattern.into(),
            classification,
        }
    }

    pub fn protected(pattern: impl Into<String>) -> Self {
        Self::new(pattern, RouteClass::Protected)
    }

    pub fn auth_entry(pattern: impl Into<String>) -> Self {
        Self::new(pattern, RouteClass::AuthEntry)
    }

    pub fn public(pattern: impl Into<String>) -> Self {
        Self::new(pattern, RouteClass::Public)
    }

    fn matches(&self, path: &str) -> bool {
        match self.classification {
            RouteClass::AuthEntry => path == self.pattern,
            RouteClass::Protected | RouteClass::Public => under_segment(path, &self.pattern),
        }
    }
}

/// Errors that can occur when building a [`RouteTable`]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteConfigError {
    /// Patterns are matched against absolute request paths
    #[error("route pattern must start with '/': {0:?}")]
    Relative(String),
    /// Only literal paths are supported
    #[error("route pattern must be a literal path, found wildcard in {0:?}")]
    Wildcard(String),
    /// An earlier rule already claims the auth entry path
    #[error("auth entry {entry:?} is shadowed by the earlier {classification:?} rule {pattern:?}")]
    ShadowedAuthEntry {
        entry: String,
        pattern: String,
        classification: RouteClass,
    },
}

/// Ordered route rules. The literal root path is always public.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Validate and normalize the given rules, keeping their order.
    ///
    /// An auth entry must be reachable: a protected auth entry would send
    /// anonymous callers from the login path back to the login path.
    pub fn new(rules: impl IntoIterator<Item = RouteRule>) -> Result<Self, RouteConfigError> {
        let rules = rules
            .into_iter()
            .map(normalize)
            .collect::<Result<Vec<_>, _>>()?;

        for (index, entry) in rules.iter().enumerate() {
            if entry.classification != RouteClass::AuthEntry {
                continue;
            }
            if let Some(earlier) = rules[..index].iter().find(|rule| rule.matches(&entry.pattern)) {
                return Err(RouteConfigError::ShadowedAuthEntry {
                    entry: entry.pattern.clone(),
                    pattern: earlier.pattern.clone(),
                    classification: earlier.classification,
                });
            }
        }

        Ok(Self { rules })
    }

    /// The common layout: one protected area and one login path.
    ///
    /// The login path is listed first so it stays an auth entry even when it
    /// lies inside the protected area.
    pub fn for_paths(protected_root: &str, login_path: &str) -> Result<Self, RouteConfigError> {
        Self::new([
            RouteRule::auth_entry(login_path),
            RouteRule::protected(protected_root),
        ])
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Classify a request path. First matching rule wins.
    pub fn classify(&self, path: &str) -> RouteClass {
        if path == "/" {
            return RouteClass::Public;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.classification)
            .unwrap_or(RouteClass::Public)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            rules: vec![
                RouteRule::protected("/dashboard"),
                RouteRule::auth_entry("/login"),
            ],
        }
    }
}

fn normalize(rule: RouteRule) -> Result<RouteRule, RouteConfigError> {
    if !rule.pattern.starts_with('/') {
        return Err(RouteConfigError::Relative(rule.pattern));
    }
    if rule.pattern.contains(['*', '?', '{', '}']) {
        return Err(RouteConfigError::Wildcard(rule.pattern));
    }

    let trimmed = rule.pattern.trim_end_matches('/');
    let pattern = if trimmed.is_empty() { "/" } else { trimmed };

    Ok(RouteRule::new(pattern, rule.classification))
}

/// `path` is `root` itself or lies below it at a `/` boundary.
fn under_segment(path: &str, root: &str) -> bool {
    if root == "/" {
        return path.starts_with('/');
    }

    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
