//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database host, expected host or host:port")]
    InvalidDatabaseHost,

    #[error("Pool size must be at least 1")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Pool idle timeout must be at least 1 second")]
    InvalidIdleTimeout,

    #[error(
        "Pool idle timeout ({idle_timeout_secs}s) must be below the reaper idle threshold ({idle_threshold_secs}s)"
    )]
    IdleTimeoutExceedsReaperThreshold {
        idle_timeout_secs: u64,
        idle_threshold_secs: u64,
    },

    #[error("Interval must be positive: {0}")]
    InvalidInterval(&'static str),

    #[error("Session TTL must be between 1 hour and 1 year")]
    InvalidSessionTtl,
}
