//! Session configuration

use chrono::Duration as ChronoDuration;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Login session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a new session in hours
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,

    /// Seconds between expired-session sweeps
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl SessionConfig {
    /// Default session lifetime
    pub fn ttl(&self) -> ChronoDuration {
        ChronoDuration::hours(self.ttl_hours)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_hours <= 0 || self.ttl_hours > 24 * 365 {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("session.cleanup_interval_secs"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_ttl_hours() -> i64 {
    24
}

fn default_cleanup_interval() -> u64 {
    3600
}
