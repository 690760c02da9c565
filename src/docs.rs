//! # axum-session-gate Documentation
//!
//! This module describes the project's architecture, components and usage
//! patterns.
//!
//! ## Overview
//!
//! The gate runs as axum middleware in front of every route. For each request
//! it classifies the path, verifies the caller's session when the class needs
//! it, and either continues to the handler or answers with a
//! `307 Temporary Redirect`.
//!
//! ## Architecture
//!
//! The project is organized into several modules:
//!
//! - **routes**: Classifies paths as public, protected or auth entry
//! - **gate**: The decision table and the axum middleware
//! - **verify**: The seam between the gate and session verification
//! - **oidc**: Discovery, token introspection, refresh and the introspection
//!   based verifier
//! - **cookies**: Request cookie rewriting and `Set-Cookie` rendering
//! - **session**: The identity handed to downstream handlers
//! - **config**: Environment driven configuration
//! - **api**: A small demo application mounted behind the gate
//!
//! ## Usage
//!
//! ### Basic Setup
//!
//! ```rust,ignore
//! let verifier = IntrospectionVerifier::builder("https://your-auth-server-url")
//!     .with_basic_auth("your-client-id", "your-client-secret")
//!     .with_introspection_cache(InMemoryIntrospectionCache::new())
//!     .build()
//!     .await?;
//!
//! let gate = Arc::new(SessionGate::new(
//!     RouteTable::default(),
//!     RedirectTargets::default(),
//!     verifier,
//! ));
//!
//! let app = Router::new()
//!     .route("/dashboard", get(dashboard))
//!     .layer(axum::middleware::from_fn_with_state(gate, session_gate));
//! ```
//!
//! ### Request Flow
//!
//! 1. The path is classified; public paths continue untouched
//! 2. The verifier is asked once for the session behind the request cookies
//! 3. An inactive access token is refreshed when a refresh token is present
//! 4. Rotated or cleared cookies are written to the request's `Cookie` header
//!    and to the response as `Set-Cookie`, whatever the outcome
//! 5. Protected paths without a session redirect to the login path; the login
//!    path with a session redirects to the protected home
//!
//! ## Components
//!
//! ### SessionVerifier
//!
//! Any type implementing [`SessionVerifier`](crate::verify::SessionVerifier)
//! can back the gate. [`IntrospectionVerifier`](crate::oidc::verifier::IntrospectionVerifier)
//! is the provided implementation.
//!
//! ### Failure Handling
//!
//! Verification errors, timeouts included, redirect protected paths to the
//! login page and let the login page render.
//!
//! ## Deployment
//!
//! The `session-gate` binary reads its configuration from the environment
//! (and an optional `.env` file). See [`Config`](crate::config::Config) for the
//! recognised variables.
