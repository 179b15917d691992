//! HTTP adapter for login session endpoints.
//!
//! Sessions are issued by the users collaborator at login; these routes only
//! read and revoke them.

mod dto;
mod handlers;
mod routes;

pub use dto::{CurrentSessionResponse, ErrorResponse};
pub use handlers::SessionHandlers;
pub use routes::session_routes;
