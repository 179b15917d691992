//! PgConnector - opens PostgreSQL connections for the pool.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::debug;

use super::map_sqlx_error;
use crate::config::DatabaseConfig;
use crate::domain::foundation::StorageError;
use crate::ports::Connector;

/// Connector for a single PostgreSQL database.
#[derive(Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    target: String,
}

impl PgConnector {
    /// Creates a connector from explicit options.
    ///
    /// `target` is only used in log lines and must not contain credentials.
    pub fn new(options: PgConnectOptions, target: impl Into<String>) -> Self {
        Self {
            options,
            target: target.into(),
        }
    }

    /// Creates a connector from application configuration.
    ///
    /// Connections identify themselves to the server with the pool name as
    /// `application_name`.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let (host, port) = config.host_and_port();
        let options = PgConnectOptions::new()
            .host(&host)
            .port(port)
            .database(&config.name)
            .username(&config.user)
            .password(config.password.expose_secret())
            .application_name(&config.pool_name);

        let target = format!("postgres://{}@{}:{}/{}", config.user, host, port, config.name);
        Self::new(options, target)
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection, StorageError> {
        PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| map_sqlx_error("Failed to connect to PostgreSQL", e))
    }

    async fn disconnect(&self, connection: PgConnection) {
        if let Err(e) = connection.close().await {
            debug!(target_db = %self.target, error = %e, "Error closing PostgreSQL connection");
        }
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn describe_never_contains_password() {
        let config = DatabaseConfig {
            host: "db.internal:6543".to_string(),
            name: "tutoring".to_string(),
            user: "svc".to_string(),
            password: Secret::new("hunter2".to_string()),
            ..Default::default()
        };

        let connector = PgConnector::from_config(&config);

        assert_eq!(connector.describe(), "postgres://svc@db.internal:6543/tutoring");
        assert!(!connector.describe().contains("hunter2"));
    }
}
