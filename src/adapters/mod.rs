//! Record store adapters
//!
//! - [`store`] - The [`RecordStore`] trait, in-memory and JSON snapshot stores
//! - [`postgresql`] - PostgreSQL store
//!
//! [`create_store`] picks the implementation named by `[source]`.

pub mod postgresql;
pub mod store;

use crate::config::schema::{RoiConfig, SourceKindConfig};
use crate::domain::{Result, RoiError};
use postgresql::PostgresStore;
use std::sync::Arc;
use store::{RecordStore, SnapshotStore};

/// Creates the record store named by the configuration
///
/// # Errors
///
/// Returns a configuration error when the selected store has no settings,
/// and a source error when a snapshot file cannot be read.
pub async fn create_store(config: &RoiConfig) -> Result<Arc<dyn RecordStore>> {
    match config.source.kind {
        SourceKindConfig::Snapshot => {
            let path = config.source.snapshot_path.as_deref().ok_or_else(|| {
                RoiError::Configuration("source.snapshot_path is not set".to_string())
            })?;
            tracing::info!(path = %path, "Opening snapshot record store");
            Ok(Arc::new(SnapshotStore::open(path).await?))
        }
        SourceKindConfig::PostgreSQL => {
            let pg_config = config.source.postgresql.clone().ok_or_else(|| {
                RoiError::Configuration("[source.postgresql] is not set".to_string())
            })?;
            let store = PostgresStore::new(pg_config)?;
            tracing::info!(
                database = %store.client().connection_string_safe(),
                "Opening PostgreSQL record store"
            );
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[tokio::test]
    async fn test_missing_snapshot_file_is_a_source_error() {
        let config = parse_config(
            r#"
[source]
kind = "snapshot"
snapshot_path = "/nonexistent/records.json"
"#,
        )
        .unwrap();

        let err = create_store(&config).await.err().unwrap();
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_postgres_store_is_created_lazily() {
        let config = parse_config(
            r#"
[source]
kind = "postgresql"

[source.postgresql]
connection_string = "postgresql://roi:pw@localhost:5432/register"
ssl_mode = "disable"
"#,
        )
        .unwrap();

        let store = create_store(&config).await.unwrap();
        assert_eq!(store.name(), "postgresql");
    }
}
