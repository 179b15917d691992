//! Error types shared by every backing-store adapter.

use thiserror::Error;

/// Failure talking to the backing store.
///
/// Adapters map their driver errors into one of these two cases so that the
/// pool and the session store never depend on a particular driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Connect or query failure mid-operation. Safe to retry.
    #[error("Storage unavailable: {0}")]
    Transient(String),

    /// A uniqueness constraint rejected the write.
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

impl StorageError {
    /// Creates a transient storage error.
    pub fn transient(message: impl Into<String>) -> Self {
        StorageError::Transient(message.into())
    }

    /// Creates an integrity violation error.
    pub fn integrity(message: impl Into<String>) -> Self {
        StorageError::IntegrityViolation(message.into())
    }

    /// Returns true for unique-constraint failures.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, StorageError::IntegrityViolation(_))
    }
}
