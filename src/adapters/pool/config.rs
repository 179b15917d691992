//! Pool tuning.

use std::time::Duration;

use super::PoolError;
use crate::config::DatabaseConfig;

/// Pool settings, fixed once the pool is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Identifier used in log lines.
    pub name: String,

    /// Maximum number of live connections.
    pub size: usize,

    /// Longest time `acquire` waits for a free connection.
    pub acquire_timeout: Duration,

    /// Idle connections older than this are closed instead of reused.
    ///
    /// Kept well below the reaper threshold so the pool never hands out a
    /// connection the server already terminated.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "tutor_hub_pool".to_string(),
            size: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PoolConfig {
    /// Create config with a custom pool name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Create config with a custom pool size.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Create config with a custom acquire timeout.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Create config with a custom idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), PoolError> {
        if self.size == 0 {
            return Err(PoolError::InvalidConfig("pool size must be at least 1".into()));
        }
        if self.acquire_timeout.is_zero() {
            return Err(PoolError::InvalidConfig(
                "acquire timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            name: config.pool_name.clone(),
            size: config.pool_size as usize,
            acquire_timeout: config.acquire_timeout(),
            idle_timeout: config.idle_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.size, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_size_is_rejected() {
        let config = PoolConfig::default().with_size(0);
        assert!(matches!(config.validate(), Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn zero_acquire_timeout_is_rejected() {
        let config = PoolConfig::default().with_acquire_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn built_from_database_config() {
        let database = DatabaseConfig {
            pool_size: 4,
            pool_name: "bookings".to_string(),
            acquire_timeout_secs: 5,
            ..Default::default()
        };
        let config = PoolConfig::from(&database);
        assert_eq!(config.name, "bookings");
        assert_eq!(config.size, 4);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }
}
