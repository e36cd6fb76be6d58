//! Compilation summary and reporting

use crate::core::compile::state::CompileState;
use crate::domain::{FindingsExt, OrganizationId, RuleCategory, ValidationFinding};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of a compilation run
#[derive(Debug, Clone)]
pub struct CompileSummary {
    pub organization_id: OrganizationId,

    pub reporting_date: NaiveDate,

    pub status: CompileState,

    /// Templates materialized, prerequisites included
    pub templates_built: usize,

    /// Templates written to the package
    pub templates_exported: usize,

    /// Rows over all materialized templates
    pub total_rows: usize,

    /// Rules in the catalog
    pub rule_count: usize,

    pub errors: usize,

    pub warnings: usize,

    pub findings_by_category: BTreeMap<RuleCategory, usize>,

    /// Whether a (final or draft) package was produced
    pub package_written: bool,

    pub duration: Duration,
}

impl CompileSummary {
    /// Tallies the findings of a run
    pub fn tally(&mut self, findings: &[ValidationFinding]) {
        self.errors = findings.error_count();
        self.warnings = findings.warning_count();
        self.findings_by_category.clear();
        for finding in findings {
            *self.findings_by_category.entry(finding.category).or_insert(0) += 1;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == CompileState::Ready
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            organization_id = %self.organization_id,
            reporting_date = %self.reporting_date,
            status = %self.status,
            templates_built = self.templates_built,
            templates_exported = self.templates_exported,
            total_rows = self.total_rows,
            errors = self.errors,
            warnings = self.warnings,
            duration_ms = self.duration.as_millis() as u64,
            "Compilation completed"
        );

        if self.errors > 0 {
            tracing::warn!(
                errors = self.errors,
                by_category = ?self.findings_by_category,
                "Register blocked by validation errors"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Severity, TemplateCode};

    fn summary() -> CompileSummary {
        CompileSummary {
            organization_id: OrganizationId::new("acme").unwrap(),
            reporting_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            status: CompileState::Blocked,
            templates_built: 15,
            templates_exported: 0,
            total_rows: 40,
            rule_count: 120,
            errors: 0,
            warnings: 0,
            findings_by_category: BTreeMap::new(),
            package_written: false,
            duration: Duration::from_millis(12),
        }
    }

    fn finding(category: RuleCategory, severity: Severity) -> ValidationFinding {
        ValidationFinding {
            template: TemplateCode::B_02_01,
            field: None,
            row: Some(0),
            rule_id: "X".to_string(),
            category,
            severity,
            message: "m".to_string(),
        }
    }

    #[test]
    fn test_tally() {
        let mut summary = summary();
        summary.tally(&[
            finding(RuleCategory::Business, Severity::Error),
            finding(RuleCategory::Business, Severity::Warning),
            finding(RuleCategory::Referential, Severity::Error),
        ]);

        assert_eq!(summary.errors, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.findings_by_category[&RuleCategory::Business], 2);
        assert!(!summary.is_ready());
    }
}
