use axum::extract::Path;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::session::Session;

pub struct AuthenticatedApi;

impl AuthenticatedApi {
    pub async fn dashboard(session: Session) -> impl IntoResponse {
        Json(session)
    }

    pub async fn page(Path(page): Path<String>, session: Session) -> impl IntoResponse {
        Json(json!({
            "page": page,
            "user_id": session.user_id,
        }))
    }
}
