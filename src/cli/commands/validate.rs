//! Validate config command implementation

use crate::adapters::create_store;
use crate::config::load_config;
use crate::config::schema::SourceKindConfig;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also open the record store and test the connection
    #[arg(long)]
    pub check_source: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        match config.source.kind {
            SourceKindConfig::Snapshot => {
                println!(
                    "  Record Store: snapshot ({})",
                    config.source.snapshot_path.as_deref().unwrap_or("-")
                );
            }
            SourceKindConfig::PostgreSQL => {
                if let Some(pg) = &config.source.postgresql {
                    println!("  Record Store: PostgreSQL");
                    println!("  Max Connections: {}", pg.max_connections);
                    println!("  SSL Mode: {}", pg.ssl_mode);
                }
            }
        }
        println!(
            "  Validation Level: {}",
            config.compile.validation_level.as_str()
        );
        println!("  On Blocked: {:?}", config.compile.on_blocked);
        if config.compile.templates.is_empty() {
            println!("  Templates: all");
        } else {
            println!("  Templates: {}", config.compile.templates.join(", "));
        }
        println!("  Output Directory: {}", config.output.directory);
        println!();

        if self.check_source {
            let store = match create_store(&config).await {
                Ok(s) => s,
                Err(e) => {
                    println!("❌ Failed to open record store: {e}");
                    return Ok(e.exit_code());
                }
            };
            if let Err(e) = store.test_connection().await {
                println!("❌ Record store connection failed: {e}");
                return Ok(e.exit_code());
            }
            println!("✅ Record store '{}' is reachable", store.name());
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_invalid_config_exit_code() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[source]\nkind = \"snapshot\"\n").unwrap();

        let args = ValidateArgs { check_source: false };
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_valid_config_exit_code() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[source]\nkind = \"snapshot\"\nsnapshot_path = \"records.json\"\n")
            .unwrap();

        let args = ValidateArgs { check_source: false };
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_unreachable_snapshot_exit_code() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"[source]\nkind = \"snapshot\"\nsnapshot_path = \"/nonexistent/records.json\"\n",
        )
        .unwrap();

        let args = ValidateArgs { check_source: true };
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 4);
    }
}
