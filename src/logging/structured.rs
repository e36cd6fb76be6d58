//! Structured logging setup using tracing
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! An optional JSON file layer writes rotated `roi.log` files.

use crate::config::LoggingConfig;
use crate::domain::{Result, RoiError};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name prefix of the rotated log files
pub const LOG_FILE_PREFIX: &str = "roi.log";

/// Keeps the file writer alive; logs are flushed when it is dropped
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }

    /// Whether a file layer is active
    pub fn has_file_output(&self) -> bool {
        self._file_guard.is_some()
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `log_level_str` when set.
///
/// # Example
///
/// ```no_run
/// use dora_roi::logging::init_logging;
/// use dora_roi::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dora_roi={}", log_level)));

    let mut layers = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone());
    layers.push(console_layer.boxed());

    let file_guard = if config.local_enabled {
        std::fs::create_dir_all(&config.local_path).map_err(|e| {
            RoiError::Configuration(format!(
                "Failed to create log directory {}: {}",
                config.local_path, e
            ))
        })?;

        let file_appender = RollingFileAppender::new(
            parse_rotation(&config.local_rotation),
            &config.local_path,
            LOG_FILE_PREFIX,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_writer(non_blocking)
            .with_filter(env_filter);
        layers.push(file_layer.boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| RoiError::Configuration(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        level = %log_level,
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard))
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

/// Parse log level from string
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(RoiError::Configuration(format!(
            "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
            level_str
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("trace", Level::TRACE)]
    #[test_case("debug", Level::DEBUG)]
    #[test_case("INFO", Level::INFO)]
    #[test_case("Warn", Level::WARN)]
    #[test_case("error", Level::ERROR)]
    fn test_parse_log_level_valid(input: &str, expected: Level) {
        assert_eq!(parse_log_level(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        assert!(parse_log_level("verbose").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("hourly"), Rotation::HOURLY);
        assert_eq!(parse_rotation("never"), Rotation::NEVER);
        assert_eq!(parse_rotation("daily"), Rotation::DAILY);
    }

    #[test]
    fn test_logging_guard_without_file() {
        let guard = LoggingGuard::new(None);
        assert!(!guard.has_file_output());
    }
}
