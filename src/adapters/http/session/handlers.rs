//! HTTP handlers for session endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use super::dto::{CurrentSessionResponse, ErrorResponse};
use crate::adapters::http::middleware::RequireAuth;
use crate::ports::SessionRevoker;

/// Handler state for the session routes.
#[derive(Clone)]
pub struct SessionHandlers {
    revoker: Arc<dyn SessionRevoker>,
}

impl SessionHandlers {
    pub fn new(revoker: Arc<dyn SessionRevoker>) -> Self {
        Self { revoker }
    }
}

/// GET /api/auth/session - Who the bearer token belongs to
pub async fn current_session(RequireAuth(user): RequireAuth) -> Json<CurrentSessionResponse> {
    Json(CurrentSessionResponse {
        user_id: user.user_id.as_i64(),
    })
}

/// DELETE /api/auth/session - Log out the presenting token
pub async fn logout(
    State(handlers): State<SessionHandlers>,
    RequireAuth(user): RequireAuth,
) -> StatusCode {
    if handlers.revoker.revoke(user.token.as_str()).await {
        info!(user_id = %user.user_id, "Session logged out");
    } else {
        // Already gone or not deletable right now; the client forgets it either way
        warn!(user_id = %user.user_id, "Logout found no session to revoke");
    }
    StatusCode::NO_CONTENT
}

/// DELETE /api/auth/sessions - Log out everywhere
pub async fn logout_everywhere(
    State(handlers): State<SessionHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    if handlers.revoker.revoke_all(user.user_id).await {
        info!(user_id = %user.user_id, "All sessions logged out");
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::unavailable("Could not revoke sessions, try again")),
        )
            .into_response()
    }
}
