//! PostgreSQL connection pool

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{Result, RoiError, SourceError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// TLS settings derived from `ssl_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TlsSettings {
    mode: SslMode,
    verify_certificate: bool,
    verify_hostname: bool,
}

fn tls_settings(ssl_mode: &str) -> Option<TlsSettings> {
    let (mode, verify_certificate, verify_hostname) = match ssl_mode {
        "disable" => return None,
        "prefer" => (SslMode::Prefer, false, false),
        "require" => (SslMode::Require, false, false),
        "verify-ca" => (SslMode::Require, true, false),
        _ => (SslMode::Require, true, true),
    };
    Some(TlsSettings {
        mode,
        verify_certificate,
        verify_hostname,
    })
}

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Creates the pool. No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable connection string or
    /// TLS setup failure.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_str()
            .parse()
            .map_err(|e| {
                RoiError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
            })?;
        pg_config.connect_timeout(Duration::from_secs(config.connection_timeout_seconds));

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match tls_settings(&config.ssl_mode) {
            None => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            Some(tls) => {
                pg_config.ssl_mode(tls.mode);
                let connector = native_tls::TlsConnector::builder()
                    .danger_accept_invalid_certs(!tls.verify_certificate)
                    .danger_accept_invalid_hostnames(!tls.verify_hostname)
                    .build()
                    .map_err(|e| {
                        RoiError::Configuration(format!("Failed to build TLS connector: {}", e))
                    })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .build()
            .map_err(|e| {
                RoiError::Configuration(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool, config })
    }

    async fn connection(&self) -> Result<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            SourceError::ConnectionFailed(format!(
                "{}: {}",
                self.connection_string_safe(),
                e
            ))
            .into()
        })
    }

    /// Checks that a connection can be opened and used
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| SourceError::ConnectionFailed(format!("Connection test failed: {}", e)))?;

        tracing::info!(
            database = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Runs a query under the configured statement timeout
    pub async fn query(&self, query: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let client = self.connection().await?;

        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .execute(timeout_query.as_str(), &[])
            .await
            .map_err(|e| SourceError::QueryFailed(format!("Failed to set statement timeout: {}", e)))?;

        client
            .query(query, params)
            .await
            .map_err(|e| SourceError::QueryFailed(e.to_string()).into())
    }

    /// Connection string with credentials redacted
    pub fn connection_string_safe(&self) -> String {
        redact(self.config.connection_string.expose_secret().as_str())
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

fn redact(connection_string: &str) -> String {
    match connection_string.rsplit_once('@') {
        Some((_, host)) => format!("postgresql://***@{}", host),
        None => "postgresql://***".to_string(),
    }
}
