//! Authentication middleware and extractor for axum.
//!
//! This module provides:
//! - `auth_middleware` - Layer that validates Bearer tokens and injects the user into extensions
//! - `RequireAuth` - Extractor that requires authentication
//!
//! # Architecture
//!
//! The middleware only sees the `SessionValidator` port, so the same layer
//! works against the pooled session store or a test double.
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedUser into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! Every rejection carries the same body. Unknown, expired and unverifiable
//! tokens are indistinguishable to the client.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::domain::foundation::UserId;
use crate::domain::session::SessionToken;
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type AuthState = Arc<dyn SessionValidator>;

/// Message returned for every authentication failure.
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or expired session";

/// Caller identity established by `auth_middleware`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    /// The bearer token that authenticated this request, kept for logout.
    pub token: SessionToken,
}

/// Uniform 401 response.
pub fn unauthenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": UNAUTHENTICATED_MESSAGE,
            "code": "UNAUTHENTICATED"
        })),
    )
        .into_response()
}

/// Authentication middleware that validates Bearer tokens.
///
/// - No `Authorization` header: continues without a user, so public routes
///   still work and `RequireAuth` rejects on protected ones
/// - Header present but not a Bearer token, or token rejected by the
///   validator: 401
/// - Token accepted: injects `AuthenticatedUser` and continues
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return next.run(request).await;
    };

    let Some(token) = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .and_then(SessionToken::parse)
    else {
        debug!("Rejected malformed Authorization header");
        return unauthenticated();
    };

    match validator.validate(token.as_str()).await {
        Some(user_id) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser { user_id, token });
            next.run(request).await
        }
        None => unauthenticated(),
    }
}

/// Extractor that requires authentication.
///
/// Rejects with the uniform 401 when `auth_middleware` did not authenticate
/// the request.
///
/// ```ignore
/// async fn whoami(RequireAuth(user): RequireAuth) -> String {
///     user.user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid session token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => unauthenticated(),
        }
    }
}
