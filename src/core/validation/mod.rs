//! Register validation
//!
//! Rules are grouped in five categories evaluated in a fixed order:
//! format, required, business, referential and aggregate. The first three
//! only read the template they belong to; the last two read several.
//!
//! - [`rule`] - Rule definitions and violations
//! - [`checks`] - Field format predicates
//! - [`catalog`] - Standard rule catalog
//! - [`engine`] - Rule evaluation and severity levels

pub mod catalog;
pub mod checks;
pub mod engine;
pub mod rule;

pub use engine::{apply_level, ValidationEngine, ValidationLevel};
pub use rule::{Check, Rule, RuleContext, RuleTarget, Violation};
