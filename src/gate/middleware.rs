use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use super::{Disposition, SessionGate};
use crate::cookies::{append_set_cookies, CookieInstruction};

/// Axum middleware running the [`SessionGate`] in front of every route.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/dashboard", get(dashboard))
///     .layer(axum::middleware::from_fn_with_state(gate, session_gate));
/// ```
pub async fn session_gate(
    State(gate): State<Arc<SessionGate>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let decision = gate.evaluate(&mut parts).await;

    match decision.disposition {
        Disposition::Continue => {
            if let Some(session) = decision.session {
                parts.extensions.insert(session);
            }
            let mut response = next.run(Request::from_parts(parts, body)).await;
            append_set_cookies(response.headers_mut(), &decision.cookies);
            response
        }
        Disposition::RedirectTo(location) => redirect_response(&location, &decision.cookies),
    }
}

/// `307 Temporary Redirect` to `location`, carrying the given cookies.
pub fn redirect_response(location: &str, cookies: &[CookieInstruction]) -> Response {
    let mut response = Redirect::temporary(location).into_response();
    append_set_cookies(response.headers_mut(), cookies);
    response
}
