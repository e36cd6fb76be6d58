//! Result type alias for the register compiler

use super::errors::RoiError;

/// Result type alias using [`RoiError`]
///
/// # Examples
///
/// ```
/// use dora_roi::domain::result::Result;
/// use dora_roi::domain::errors::RoiError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RoiError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RoiError>;
