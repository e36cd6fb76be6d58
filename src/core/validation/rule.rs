//! Validation rules as data
//!
//! A rule names the template and field it inspects, its category and
//! severity, and a pure check. Checks return violations located by row and
//! field; the engine turns them into findings.

use crate::core::registry::FieldFormat;
use crate::core::relation::{Relation, RelationSet};
use crate::domain::{RuleCategory, Severity, TemplateCode};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Run-level inputs available to every check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext {
    pub reporting_date: NaiveDate,
    /// Contracts ending within this many days of the reporting date are
    /// flagged
    pub expiry_warning_days: i64,
}

impl RuleContext {
    pub fn new(reporting_date: NaiveDate, expiry_warning_days: i64) -> Self {
        Self {
            reporting_date,
            expiry_warning_days,
        }
    }

    /// Last day of the expiry advisory window, clamped to the last
    /// representable date
    pub fn expiry_horizon(&self) -> NaiveDate {
        Duration::try_days(self.expiry_warning_days)
            .and_then(|window| self.reporting_date.checked_add_signed(window))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// One located rule violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub row: Option<usize>,
    pub field: Option<&'static str>,
    pub message: String,
}

impl Violation {
    pub fn at(row: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            field: None,
            message: message.into(),
        }
    }

    pub fn relation(message: impl Into<String>) -> Self {
        Self {
            row: None,
            field: None,
            message: message.into(),
        }
    }
}

/// What part of the register a rule inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Field(&'static str),
    Row,
    Relation,
    /// The rule's template read together with other templates
    CrossTemplate(Vec<TemplateCode>),
}

pub type RelationCheck = Arc<dyn Fn(&Relation, &RuleContext) -> Vec<Violation> + Send + Sync>;
pub type CrossCheck = Arc<dyn Fn(&RelationSet, &RuleContext) -> Vec<Violation> + Send + Sync>;

/// The check a rule performs
#[derive(Clone)]
pub enum Check {
    /// Field value conforms to a declared format
    Format(FieldFormat),
    /// Field value conforms to a compiled pattern
    Pattern(Regex),
    /// Field value is present
    Required,
    /// Every non-empty field value exists as a key of another template
    References {
        target: TemplateCode,
        target_field: &'static str,
    },
    /// Check over the rule's own relation
    Relation(RelationCheck),
    /// Check over the whole relation set
    Cross(CrossCheck),
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Format(format) => write!(f, "Format({})", format.describe()),
            Check::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Check::Required => f.write_str("Required"),
            Check::References {
                target,
                target_field,
            } => write!(f, "References({target}.{target_field})"),
            Check::Relation(_) => f.write_str("Relation(..)"),
            Check::Cross(_) => f.write_str("Cross(..)"),
        }
    }
}

/// A validation rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub template: TemplateCode,
    pub target: RuleTarget,
    pub description: String,
    pub check: Check,
}

impl Rule {
    /// Rule checking the declared format of a field
    pub fn format(template: TemplateCode, field: &'static str, format: FieldFormat) -> Self {
        Self {
            id: format!("FMT-{template}-{field}"),
            category: RuleCategory::Format,
            severity: Severity::Error,
            template,
            target: RuleTarget::Field(field),
            description: format!("{template} {field} must be a {}", format.describe()),
            check: Check::Format(format),
        }
    }

    /// Rule requiring a field; recommended fields are checked as warnings
    pub fn required(template: TemplateCode, field: &'static str, severity: Severity) -> Self {
        Self {
            id: format!("REQ-{template}-{field}"),
            category: RuleCategory::Required,
            severity,
            template,
            target: RuleTarget::Field(field),
            description: format!("{template} {field} must be reported"),
            check: Check::Required,
        }
    }

    /// Referential rule from a field to the key column of another template
    pub fn references(
        id: &str,
        severity: Severity,
        template: TemplateCode,
        field: &'static str,
        target: TemplateCode,
        target_field: &'static str,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            category: RuleCategory::Referential,
            severity,
            template,
            target: RuleTarget::Field(field),
            description: description.to_string(),
            check: Check::References {
                target,
                target_field,
            },
        }
    }

    /// Rule over the rule's own relation
    pub fn relation<F>(
        id: &str,
        category: RuleCategory,
        severity: Severity,
        template: TemplateCode,
        target: RuleTarget,
        description: &str,
        check: F,
    ) -> Self
    where
        F: Fn(&Relation, &RuleContext) -> Vec<Violation> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            category,
            severity,
            template,
            target,
            description: description.to_string(),
            check: Check::Relation(Arc::new(check)),
        }
    }

    /// Rule reading several templates; findings are reported on `template`
    pub fn cross<F>(
        id: &str,
        category: RuleCategory,
        severity: Severity,
        template: TemplateCode,
        others: &[TemplateCode],
        description: &str,
        check: F,
    ) -> Self
    where
        F: Fn(&RelationSet, &RuleContext) -> Vec<Violation> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            category,
            severity,
            template,
            target: RuleTarget::CrossTemplate(others.to_vec()),
            description: description.to_string(),
            check: Check::Cross(Arc::new(check)),
        }
    }

    /// Templates that must be materialized for the rule to run
    pub fn required_templates(&self) -> Vec<TemplateCode> {
        let mut templates = vec![self.template];
        match (&self.target, &self.check) {
            (_, Check::References { target, .. }) => templates.push(*target),
            (RuleTarget::CrossTemplate(others), _) => templates.extend(others.iter().copied()),
            _ => {}
        }
        templates
    }

    /// Field the rule is anchored on, if any
    pub fn field(&self) -> Option<&'static str> {
        match self.target {
            RuleTarget::Field(field) => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_horizon() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(
            RuleContext::new(date, 90).expiry_horizon(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
        );
    }

    #[test]
    fn test_expiry_horizon_saturates() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(RuleContext::new(date, 200_000_000).expiry_horizon(), NaiveDate::MAX);
        assert_eq!(RuleContext::new(date, i64::MAX).expiry_horizon(), NaiveDate::MAX);
    }

    #[test]
    fn test_generated_ids() {
        let rule = Rule::format(TemplateCode::B_01_01, "c0010", FieldFormat::Lei);
        assert_eq!(rule.id, "FMT-B_01.01-c0010");
        assert_eq!(rule.category, RuleCategory::Format);

        let rule = Rule::required(TemplateCode::B_07_01, "c0070", Severity::Warning);
        assert_eq!(rule.id, "REQ-B_07.01-c0070");
        assert_eq!(rule.severity, Severity::Warning);
    }

    #[test]
    fn test_required_templates() {
        let rule = Rule::references(
            "REF-001",
            Severity::Error,
            TemplateCode::B_02_02,
            "c0010",
            TemplateCode::B_02_01,
            "c0010",
            "contract exists",
        );
        assert_eq!(
            rule.required_templates(),
            vec![TemplateCode::B_02_02, TemplateCode::B_02_01]
        );
        assert_eq!(rule.field(), Some("c0010"));
    }

    #[test]
    fn test_expiry_horizon_via_ctx() {
        let ctx = RuleContext::new(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(), 90);
        assert_eq!(
            ctx.expiry_horizon(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
        );
    }
}
