//! Session record.

use chrono::Duration;

use super::SessionToken;
use crate::domain::foundation::{Timestamp, UserId};

/// Observable state of a stored session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// `now < expires_at`.
    Active,
    /// `now >= expires_at`; the row is deleted on the next read.
    Expired,
}

/// Server-side record binding a token to a user and an absolute expiry.
///
/// The expiry is fixed at issue time and never extended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: SessionToken,
    user_id: UserId,
    expires_at: Timestamp,
}

impl Session {
    /// Reconstitutes a session from stored fields.
    pub fn new(token: SessionToken, user_id: UserId, expires_at: Timestamp) -> Self {
        Self {
            token,
            user_id,
            expires_at,
        }
    }

    /// Issues a session with a freshly generated token expiring `ttl` after `now`.
    ///
    /// `None` when `now + ttl` falls outside the representable time range.
    pub fn issue(user_id: UserId, now: Timestamp, ttl: Duration) -> Option<Self> {
        let expires_at = now.checked_plus(ttl)?;
        Some(Self::new(SessionToken::generate(), user_id, expires_at))
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Status of the session at `now`.
    pub fn status_at(&self, now: Timestamp) -> SessionStatus {
        if now.is_before(&self.expires_at) {
            SessionStatus::Active
        } else {
            SessionStatus::Expired
        }
    }

    /// True when the session still authenticates at `now`.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status_at(now) == SessionStatus::Active
    }

    /// Replaces the token, keeping user and expiry. Used after a token collision.
    pub fn with_token(self, token: SessionToken) -> Self {
        Self { token, ..self }
    }
}
