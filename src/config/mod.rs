//! Application configuration module
//!
//! Configuration is read from environment variables with the `TUTOR_HUB`
//! prefix; nested values are separated by a double underscore.
//!
//! # Example
//!
//! ```no_run
//! use tutor_hub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod reaper;
mod server;
mod session;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use reaper::ReaperConfig;
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads a local
/// development setup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection and pool)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Idle-connection reaper
    #[serde(default)]
    pub reaper: ReaperConfig,

    /// Login sessions
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `TUTOR_HUB`-prefixed variables:
    ///
    /// - `TUTOR_HUB__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TUTOR_HUB__DATABASE__HOST=db:5432` -> `database.host = "db:5432"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TUTOR_HUB")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.reaper.validate()?;
        self.session.validate()?;

        // Parked connections must be recycled before the reaper would kill them
        if self.reaper.enabled
            && self.database.idle_timeout_secs >= self.reaper.idle_threshold_secs
        {
            return Err(ValidationError::IdleTimeoutExceedsReaperThreshold {
                idle_timeout_secs: self.database.idle_timeout_secs,
                idle_threshold_secs: self.reaper.idle_threshold_secs,
            });
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
