//! Validation findings

use crate::domain::ids::TemplateCode;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity of a finding. Errors block the export, warnings are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Rule categories, declared in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Format,
    Required,
    Business,
    Referential,
    Aggregate,
}

impl RuleCategory {
    /// Categories evaluated per template as soon as it is materialized
    pub fn is_intra_template(&self) -> bool {
        matches!(
            self,
            RuleCategory::Format | RuleCategory::Required | RuleCategory::Business
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Format => "format",
            RuleCategory::Required => "required",
            RuleCategory::Business => "business",
            RuleCategory::Referential => "referential",
            RuleCategory::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule violation located in the register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub template: TemplateCode,
    /// Field code, absent for whole-row and relation-level findings
    pub field: Option<String>,
    /// Zero-based row index, absent for relation-level findings
    pub row: Option<usize>,
    pub rule_id: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub message: String,
}

impl ValidationFinding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn sort_key(&self) -> (TemplateCode, Option<usize>, &str, Option<&str>, &str) {
        (
            self.template,
            self.row,
            self.rule_id.as_str(),
            self.field.as_deref(),
            self.message.as_str(),
        )
    }
}

impl PartialOrd for ValidationFinding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValidationFinding {
    /// Template, then row index, then rule id. Field and message break the
    /// remaining ties so the order is total.
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| (self.severity as u8).cmp(&(other.severity as u8)))
    }
}

impl fmt::Display for ValidationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.severity, self.rule_id, self.template)?;
        if let Some(row) = self.row {
            write!(f, " row {row}")?;
        }
        if let Some(field) = &self.field {
            write!(f, " {field}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Counting helpers over a finding list
pub trait FindingsExt {
    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

impl FindingsExt for [ValidationFinding] {
    fn error_count(&self) -> usize {
        self.iter().filter(|f| f.is_error()).count()
    }

    fn warning_count(&self) -> usize {
        self.iter().filter(|f| !f.is_error()).count()
    }
}
