//! HTTP middleware for axum.
//!
//! - `auth` - Bearer-token authentication middleware and extractor

pub mod auth;

pub use auth::{
    auth_middleware, unauthenticated, AuthRejection, AuthState, AuthenticatedUser, RequireAuth,
    UNAUTHENTICATED_MESSAGE,
};
