//! Tutor Hub - resource and session layer of the tutoring marketplace backend.
//!
//! A bounded pool of PostgreSQL connections, a background reaper that
//! terminates leaked idle connections on the server, and a token-based
//! session store built on the pool. CRUD managers elsewhere in the backend
//! consume the pool's acquire/release contract and the HTTP layer consumes
//! the session store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
