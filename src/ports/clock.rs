//! Clock port.

use crate::domain::foundation::Timestamp;

/// Source of the current instant.
///
/// Every expiry decision reads "now" from here rather than from the storage
/// server, so expiry behaves the same on every adapter and tests can move time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
