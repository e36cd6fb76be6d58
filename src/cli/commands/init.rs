//! Init command implementation
//!
//! Writes a starter `roi.toml`.

use clap::Args;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path of the configuration file to create
    #[arg(short, long, default_value = "roi.toml")]
    pub output: String,

    /// Configure a PostgreSQL record store instead of a snapshot file
    #[arg(long)]
    pub postgresql: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

const SNAPSHOT_SOURCE: &str = r#"[source]
kind = "snapshot"
snapshot_path = "./records.json"
"#;

const POSTGRESQL_SOURCE: &str = r#"[source]
kind = "postgresql"

[source.postgresql]
connection_string = "${ROI_DATABASE_URL}"
max_connections = 10
connection_timeout_seconds = 30
statement_timeout_seconds = 60
ssl_mode = "require"
"#;

const COMMON_SECTIONS: &str = r#"
[compile]
# lenient keeps warnings advisory, strict turns them into errors
validation_level = "lenient"
# skip writes nothing when blocked, draft writes a package marked draft
on_blocked = "skip"
# Template codes to export; empty exports the whole register
templates = []
build_concurrency = 4
expiry_warning_days = 90

[output]
directory = "./register"
include_parameters = true
base_currency = "EUR"
overwrite = false

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#;

impl InitArgs {
    /// Starter configuration text
    pub fn render(&self) -> String {
        let source = if self.postgresql {
            POSTGRESQL_SOURCE
        } else {
            SNAPSHOT_SOURCE
        };
        format!(
            "# DORA Register of Information compiler configuration\n\
             environment = \"development\"\n\
             \n\
             [application]\n\
             log_level = \"info\"\n\
             \n\
             {source}{COMMON_SECTIONS}"
        )
    }

    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        if let Err(e) = tokio::fs::write(&self.output, self.render()).await {
            println!("❌ Failed to write configuration file");
            println!("   Error: {e}");
            return Ok(5);
        }

        println!("✅ Configuration file created: {}", self.output);
        println!();
        println!("Next steps:");
        if self.postgresql {
            println!("  1. Set ROI_DATABASE_URL (a .env file works)");
            println!("  2. Create the tables from migrations/001_register_schema.sql");
        } else {
            println!("  1. Export your register records to ./records.json");
        }
        println!("  - Validate configuration: roi validate-config --check-source");
        println!("  - Compile: roi compile --org <organization> --date <YYYY-MM-DD>");
        Ok(0)
    }
}
