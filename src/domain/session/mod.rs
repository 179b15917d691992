//! Login sessions.
//!
//! A session binds an opaque bearer token to a user id and an absolute expiry.
//! Lifecycle: issued active, then either expires or is revoked, after which the
//! row is deleted. A terminal session is never reactivated; the user gets a new
//! token instead.

mod record;
mod token;

pub use record::{Session, SessionStatus};
pub use token::{SessionToken, MAX_TOKEN_LEN, TOKEN_BYTES};
