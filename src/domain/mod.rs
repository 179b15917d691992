//! Domain layer containing the types the session layer is built from.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `session` - Login session record and its opaque token

pub mod foundation;
pub mod session;
