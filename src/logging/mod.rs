//! Logging and observability
//!
//! Structured logging via `tracing`, plus a few macros that keep the field
//! names of recurring events consistent.
//!
//! ```no_run
//! use dora_roi::logging::init_logging;
//! use dora_roi::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//! tracing::info!("Compiler started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a compilation
///
/// ```no_run
/// use dora_roi::log_compile_start;
/// use dora_roi::domain::OrganizationId;
/// use chrono::NaiveDate;
///
/// let org = OrganizationId::new("acme").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
/// log_compile_start!(&org, date);
/// ```
#[macro_export]
macro_rules! log_compile_start {
    ($organization_id:expr, $reporting_date:expr) => {
        tracing::info!(
            organization_id = %$organization_id,
            reporting_date = %$reporting_date,
            "Starting compilation"
        );
    };
}

/// Log a materialized template
#[macro_export]
macro_rules! log_template_built {
    ($template:expr, $rows:expr, $elapsed_ms:expr) => {
        tracing::debug!(
            template = %$template,
            rows = $rows,
            duration_ms = $elapsed_ms as u64,
            "Template built"
        );
    };
}

/// Log an error with context
///
/// ```no_run
/// use dora_roi::log_error_with_context;
/// use dora_roi::domain::RoiError;
///
/// let error = RoiError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{OrganizationId, RoiError, TemplateCode};
    use chrono::NaiveDate;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let org = OrganizationId::new("acme").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        crate::log_compile_start!(&org, date);
        crate::log_template_built!(TemplateCode::B_01_01, 1usize, 3u128);
        crate::log_error_with_context!(&RoiError::Other("boom".to_string()), "test");
    }
}
