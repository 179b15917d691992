//! Session validation ports consumed by the HTTP layer.
//!
//! The HTTP middleware only needs "token in, user id out"; logout handlers
//! need revocation. Both are provider-agnostic so the routes can be tested
//! against any implementation.

use async_trait::async_trait;

use crate::domain::foundation::UserId;

/// Resolves a bearer token to the user it authenticates.
///
/// # Contract
///
/// Returns `None` for unknown, expired, malformed tokens and for storage
/// failures alike. Callers must not be able to tell these apart.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Option<UserId>;
}

/// Revokes sessions on logout.
#[async_trait]
pub trait SessionRevoker: Send + Sync {
    /// Revokes one token; true if it existed.
    async fn revoke(&self, token: &str) -> bool;

    /// Revokes every session of a user; true if the operation succeeded.
    async fn revoke_all(&self, user_id: UserId) -> bool;
}
