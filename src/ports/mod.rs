//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the session layer and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `Connector` - Opens and closes one backing-store connection
//! - `SessionRows` - Session table operations on a checked-out connection
//! - `ConnectionAdmin` - Storage-side view of open connections (reaper only)
//!
//! ## Service Ports
//!
//! - `Clock` - Source of "now" for expiry decisions
//! - `SessionValidator` / `SessionRevoker` - Consumed by the HTTP layer

mod clock;
mod connection_admin;
mod connector;
mod session_rows;
mod session_validator;

pub use clock::Clock;
pub use connection_admin::{BackendConnection, ConnectionAdmin};
pub use connector::Connector;
pub use session_rows::SessionRows;
pub use session_validator::{SessionRevoker, SessionValidator};
