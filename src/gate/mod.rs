//! The session gate.
//!
//! For every request the gate classifies the path, verifies the session when
//! the path needs it, mirrors refreshed cookies onto the in-flight request and
//! decides whether the request continues or is redirected.
//!
//! | classification | verification  | disposition                |
//! |----------------|---------------|----------------------------|
//! | public         | not performed | continue                   |
//! | protected      | session       | continue                   |
//! | protected      | no session    | redirect to login          |
//! | protected      | error         | redirect to login          |
//! | auth entry     | session       | redirect to protected home |
//! | auth entry     | no session    | continue                   |
//! | auth entry     | error         | continue                   |

mod middleware;

pub use middleware::{redirect_response, session_gate};

use axum::http::request::Parts;
use std::sync::Arc;

use crate::cookies::{CookieInstruction, RequestCookies};
use crate::routes::{RouteClass, RouteTable};
use crate::session::Session;
use crate::verify::{SessionVerifier, Verification, VerifyResult};

/// What happens to a request after the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    RedirectTo(String),
}

/// Where redirects point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectTargets {
    /// Auth entry point, for callers without a session.
    pub login: String,
    /// Landing page of the protected area, for callers that already have one.
    pub protected_home: String,
}

impl RedirectTargets {
    pub fn new(login: impl Into<String>, protected_home: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            protected_home: protected_home.into(),
        }
    }
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self::new("/login", "/dashboard")
    }
}

/// Result of running the gate over one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateDecision {
    pub disposition: Disposition,
    /// Cookies to mirror onto the response, whatever the disposition.
    pub cookies: Vec<CookieInstruction>,
    pub session: Option<Session>,
}

impl GateDecision {
    fn bypass() -> Self {
        Self {
            disposition: Disposition::Continue,
            cookies: Vec::new(),
            session: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionGate {
    routes: RouteTable,
    targets: RedirectTargets,
    verifier: Arc<dyn SessionVerifier>,
}

impl SessionGate {
    pub fn new(
        routes: RouteTable,
        targets: RedirectTargets,
        verifier: impl SessionVerifier + 'static,
    ) -> Self {
        Self {
            routes,
            targets,
            verifier: Arc::new(verifier),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn targets(&self) -> &RedirectTargets {
        &self.targets
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        self.routes.classify(path)
    }

    /// Apply the decision table. Pure: the same inputs give the same result.
    pub fn decide(&self, classification: RouteClass, result: &VerifyResult) -> Disposition {
        match classification {
            RouteClass::Public => Disposition::Continue,
            RouteClass::Protected => match result {
                Ok(Some(_)) => Disposition::Continue,
                Ok(None) => Disposition::RedirectTo(self.targets.login.clone()),
                Err(_) => Disposition::RedirectTo(self.targets.login.clone()),
            },
            RouteClass::AuthEntry => match result {
                Ok(Some(_)) => Disposition::RedirectTo(self.targets.protected_home.clone()),
                Ok(None) => Disposition::Continue,
                Err(_) => Disposition::Continue,
            },
        }
    }

    /// Run the gate over a request.
    ///
    /// Public paths return immediately without a verification call. Otherwise
    /// the verifier is called once and its cookie instructions are applied to
    /// the request's `Cookie` header before the decision is returned.
    pub async fn evaluate(&self, parts: &mut Parts) -> GateDecision {
        let path = parts.uri.path();
        let classification = self.routes.classify(path);
        tracing::debug!(path, ?classification, "classified request");

        if classification == RouteClass::Public {
            return GateDecision::bypass();
        }

        let mut cookies = RequestCookies::from_headers(&parts.headers);
        let Verification {
            result,
            set_cookies,
        } = self.verifier.verify(&cookies).await;

        if let Err(err) = &result {
            tracing::warn!(path, ?classification, error = %err, "session verification failed");
        }

        if !set_cookies.is_empty() {
            for instruction in &set_cookies {
                cookies.apply(instruction);
            }
            cookies.write_to(&mut parts.headers);
        }

        let disposition = self.decide(classification, &result);
        if let Disposition::RedirectTo(location) = &disposition {
            tracing::info!(path, %location, "redirecting request");
        }

        GateDecision {
            disposition,
            cookies: set_cookies,
            session: result.ok().flatten(),
        }
    }
}
