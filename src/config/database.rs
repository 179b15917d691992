//! Database configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL host, optionally with a port (`db.internal:6543`)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port used when `host` does not carry one
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    #[serde(default = "default_name")]
    pub name: String,

    /// Login role
    #[serde(default = "default_user")]
    pub user: String,

    /// Login password
    #[serde(default = "default_password")]
    pub password: Secret<String>,

    /// Maximum live connections in the pool
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool identifier, also sent to the server as `application_name`
    #[serde(default = "default_pool_name")]
    pub pool_name: String,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Run migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Splits `host` into host and port, falling back to `port`.
    ///
    /// A port embedded in `host` wins over the `port` field.
    pub fn host_and_port(&self) -> (String, u16) {
        match self.host.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (self.host.clone(), self.port),
            },
            None => (self.host.clone(), self.port),
        }
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_HOST"));
        }
        if let Some((_, port)) = self.host.rsplit_once(':') {
            if port.parse::<u16>().map_or(true, |p| p == 0) {
                return Err(ValidationError::InvalidDatabaseHost);
            }
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_NAME"));
        }
        if self.user.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE_USER"));
        }
        if self.pool_size == 0 {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.pool_size > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.idle_timeout_secs == 0 {
            return Err(ValidationError::InvalidIdleTimeout);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_name(),
            user: default_user(),
            password: default_password(),
            pool_size: default_pool_size(),
            pool_name: default_pool_name(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: false,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "tutor_hub".to_string()
}

fn default_user() -> String {
    "tutor_hub".to_string()
}

fn default_password() -> Secret<String> {
    Secret::new(String::new())
}

fn default_pool_size() -> u32 {
    10
}

fn default_pool_name() -> String {
    "tutor_hub_pool".to_string()
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}
