//! HTTP adapters - axum routes over the session layer.
//!
//! - `middleware` - Bearer-token authentication
//! - `session` - Whoami and logout endpoints
//! - `health` - Pool-backed health check

pub mod health;
pub mod middleware;
pub mod session;

use std::sync::Arc;

use axum::Router;

use crate::adapters::pool::ConnectionPool;
use crate::application::SessionStore;
use crate::ports::{Connector, SessionRows};

pub use health::health_routes;
pub use session::{session_routes, SessionHandlers};

/// Full application router: session endpoints plus `/health`.
pub fn app_router<C>(store: SessionStore<C>, pool: ConnectionPool<C>) -> Router
where
    C: Connector,
    C::Connection: SessionRows,
{
    let store = Arc::new(store);
    session_routes(SessionHandlers::new(store.clone()), store).merge(health_routes(pool))
}
