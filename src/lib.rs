//! # axum-session-gate
//!
//! Axum middleware that sits in front of an application, classifies every
//! request path and lets it through, redirects it to the login entry point,
//! or sends an already signed-in caller away from the login page.
//!
//! ## Features
//!
//! - Route classification into public, protected and auth entry paths
//! - Session verification through OAuth 2.0 Token Introspection
//! - Access token refresh with cookie rotation, mirrored onto the in-flight
//!   request and the response
//! - Fail closed on protected paths, fail open on the login page
//!
//! See the [docs](crate::docs) module for comprehensive documentation.

pub mod api;
pub mod config;
pub mod cookies;
mod docs;
pub mod error;
pub mod gate;
pub mod oidc;
pub mod routes;
pub mod session;
pub mod verify;

#[cfg(test)]
mod testing;

pub use cookies::{CookieInstruction, CookieOptions, RequestCookies};
pub use error::VerificationError;
pub use gate::{session_gate, Disposition, GateDecision, RedirectTargets, SessionGate};
pub use oidc::verifier::{IntrospectionVerifier, IntrospectionVerifierBuilder};
pub use routes::{RouteClass, RouteRule, RouteTable};
pub use session::Session;
pub use verify::{SessionVerifier, Verification, VerifyResult};
