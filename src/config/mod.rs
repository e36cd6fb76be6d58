//! Configuration management
//!
//! `roi.toml` names the record store, the compilation defaults and the
//! package output. Values may reference the environment with `${VAR}` and
//! every key can be overridden with a `ROI_<SECTION>_<KEY>` variable.
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [application]
//! log_level = "info"
//!
//! [source]
//! kind = "postgresql"
//!
//! [source.postgresql]
//! connection_string = "${ROI_DATABASE_URL}"
//! ssl_mode = "require"
//!
//! [compile]
//! validation_level = "strict"
//! on_blocked = "skip"
//!
//! [output]
//! directory = "./register"
//! ```
//!
//! ```rust,no_run
//! use dora_roi::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("roi.toml")?;
//! println!("Output: {}", config.output.directory);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, CompileConfig, Environment, LoggingConfig, OutputConfig, PostgreSQLConfig,
    RoiConfig, SourceConfig, SourceKindConfig,
};
pub use secret::{secret_string, SecretString, SecretText};
