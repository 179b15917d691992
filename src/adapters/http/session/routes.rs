//! HTTP routes for session endpoints.

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};

use super::handlers::{current_session, logout, logout_everywhere, SessionHandlers};
use crate::adapters::http::middleware::{auth_middleware, AuthState};

/// Creates the session router, guarded by `auth_middleware`.
pub fn session_routes(handlers: SessionHandlers, auth: AuthState) -> Router {
    Router::new()
        .route("/api/auth/session", get(current_session).delete(logout))
        .route("/api/auth/sessions", delete(logout_everywhere))
        .with_state(handlers)
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
}
