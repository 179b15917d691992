//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the Tutor Hub session layer.

mod errors;
mod ids;
mod timestamp;

pub use errors::StorageError;
pub use ids::UserId;
pub use timestamp::Timestamp;
