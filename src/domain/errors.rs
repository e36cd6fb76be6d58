//! Domain error types
//!
//! Configuration problems (descriptor cycles, unknown rule targets, invalid
//! config files) and source store failures are hard errors. Problems found in
//! the register data itself are never errors: they are reported as
//! [`ValidationFinding`](crate::domain::ValidationFinding)s.

use thiserror::Error;

/// Main error type for the register compiler
#[derive(Debug, Error)]
pub enum RoiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Template registry and rule catalog errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Record store errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Package verification errors
    #[error("Verification error: {0}")]
    Verification(String),

    /// Invalid input values (identifiers, dates, options)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A compilation was driven through an invalid state transition
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while assembling the template registry, the build plan or
/// the rule catalog. All of them abort a compilation before any data is read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The declared template dependencies contain a cycle
    #[error("Dependency cycle between templates: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// A template depends on a template that is not registered
    #[error("Template {template} depends on unregistered template {dependency}")]
    MissingDescriptor { template: String, dependency: String },

    /// The same template code was registered twice
    #[error("Template {0} is registered more than once")]
    DuplicateDescriptor(String),

    /// A template code that the registry does not know
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// A validation rule targets a template or field that does not exist
    #[error("Rule {rule_id} is invalid: {reason}")]
    InvalidRule { rule_id: String, reason: String },
}

/// Record store errors
///
/// These never expose driver types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to connect to the record store
    #[error("Failed to connect to record store: {0}")]
    ConnectionFailed(String),

    /// A query against the record store failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The organization has no reporting entity in the store
    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    /// A stored record could not be decoded
    #[error("Invalid record in {kind}: {message}")]
    InvalidRecord { kind: String, message: String },
}

impl RoiError {
    /// Exit code reported by the CLI for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            RoiError::Configuration(_) | RoiError::Registry(_) => 2,
            RoiError::Source(_) => 4,
            _ => 5,
        }
    }
}

impl From<std::io::Error> for RoiError {
    fn from(err: std::io::Error) -> Self {
        RoiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RoiError {
    fn from(err: serde_json::Error) -> Self {
        RoiError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for RoiError {
    fn from(err: csv::Error) -> Self {
        RoiError::Serialization(format!("CSV error: {err}"))
    }
}

impl From<toml::de::Error> for RoiError {
    fn from(err: toml::de::Error) -> Self {
        RoiError::Configuration(format!("TOML parse error: {err}"))
    }
}
