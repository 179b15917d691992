//! Pool error types.

use std::time::Duration;

use thiserror::Error;

use crate::domain::foundation::StorageError;

/// Errors surfaced by `ConnectionPool`.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Pool settings are unusable. Fatal at startup.
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    /// The backing store was unreachable during `initialize`. Fatal at startup.
    #[error("Failed to initialize connection pool: {0}")]
    Init(#[source] StorageError),

    /// `acquire` was called before `initialize` or after `shutdown`.
    #[error("Connection pool not initialized")]
    NotInitialized,

    /// No connection became free within the acquire timeout.
    #[error("No connection available after waiting {waited:?}")]
    Exhausted { waited: Duration },

    /// Opening a new connection failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PoolError {
    /// Returns true when retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoolError::Exhausted { .. } | PoolError::Storage(StorageError::Transient(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustion_is_retryable() {
        let err = PoolError::Exhausted {
            waited: Duration::from_millis(50),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn not_initialized_is_not_retryable() {
        assert!(!PoolError::NotInitialized.is_retryable());
        assert!(!PoolError::Init(StorageError::transient("refused")).is_retryable());
    }

    #[test]
    fn init_error_includes_cause() {
        let err = PoolError::Init(StorageError::transient("connection refused"));
        assert!(err.to_string().contains("connection refused"));
    }
}
