//! Idle-connection reaper configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Idle-connection reaper configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReaperConfig {
    /// Start the reaper at boot
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between reaper ticks
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Idle seconds after which a connection is terminated
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_secs: u64,

    /// Seconds to wait for the reaper on shutdown
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,
}

impl ReaperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Validate reaper configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("reaper.interval_secs"));
        }
        if self.idle_threshold_secs == 0 {
            return Err(ValidationError::InvalidInterval("reaper.idle_threshold_secs"));
        }
        Ok(())
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            idle_threshold_secs: default_idle_threshold(),
            stop_timeout_secs: default_stop_timeout(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    300
}

fn default_idle_threshold() -> u64 {
    3600
}

fn default_stop_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaper_defaults() {
        let config = ReaperConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.idle_threshold(), Duration::from_secs(3600));
        assert_eq!(config.stop_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ReaperConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
