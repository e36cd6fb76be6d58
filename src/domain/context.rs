//! Error context extension trait
//!
//! Works like `anyhow::Context` but keeps library code on [`RoiError`].
//!
//! ```rust
//! use dora_roi::domain::Result;
//! use dora_roi::domain::context::ResultExt;
//!
//! fn read_manifest(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_context(|| format!("Failed to read manifest {path}"))
//! }
//! ```

use crate::domain::errors::RoiError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error, computed only when the result is an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<RoiError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

/// Configuration and source errors keep their variant so the CLI can still
/// map them to the right exit code.
fn wrap(base: RoiError, context: impl std::fmt::Display) -> RoiError {
    match base {
        RoiError::Configuration(msg) => RoiError::Configuration(format!("{context}: {msg}")),
        RoiError::Io(msg) => RoiError::Io(format!("{context}: {msg}")),
        other => RoiError::Other(format!("{context}: {other}")),
    }
}
