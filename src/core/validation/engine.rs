//! Validation rule engine
//!
//! Format, required and business rules only read the relation they belong
//! to and run per template, as soon as the template is built. Referential
//! and aggregate rules read several templates and run once the whole
//! relation set exists. Findings are collected from every rule and sorted.

use crate::core::registry::{FieldFormat, Presence, TemplateRegistry};
use crate::core::relation::{Relation, RelationSet};
use crate::core::validation::catalog;
use crate::core::validation::checks::format_violations;
use crate::core::validation::rule::{Check, Rule, RuleContext, RuleTarget, Violation};
use crate::domain::{
    RegistryError, Result, RoiError, RuleCategory, Severity, TemplateCode, ValidationFinding,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

/// How warnings weigh on the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    /// Warnings are escalated to errors
    Strict,
    /// Warnings are reported but never block
    #[default]
    Lenient,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationLevel::Strict => "strict",
            ValidationLevel::Lenient => "lenient",
        }
    }
}

impl std::str::FromStr for ValidationLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(ValidationLevel::Strict),
            "lenient" => Ok(ValidationLevel::Lenient),
            other => Err(format!(
                "Invalid validation level '{other}', expected strict or lenient"
            )),
        }
    }
}

/// Applies the validation level to a finding list
pub fn apply_level(mut findings: Vec<ValidationFinding>, level: ValidationLevel) -> Vec<ValidationFinding> {
    if level == ValidationLevel::Strict {
        for finding in findings.iter_mut().filter(|f| f.severity == Severity::Warning) {
            finding.severity = Severity::Error;
            finding.message.push_str(" (escalated by strict validation)");
        }
    }
    findings
}

/// Validated rule set bound to a registry
pub struct ValidationEngine {
    registry: Arc<TemplateRegistry>,
    rules: Vec<Rule>,
}

impl ValidationEngine {
    /// Checks every rule against the registry and compiles its patterns
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidRule` for a rule that targets an
    /// unregistered template or field, or carries an invalid pattern.
    pub fn new(registry: Arc<TemplateRegistry>, rules: Vec<Rule>) -> std::result::Result<Self, RegistryError> {
        let mut checked = Vec::with_capacity(rules.len());
        for mut rule in rules {
            check_targets(&registry, &rule)?;
            if let Check::Format(FieldFormat::Pattern(pattern)) = rule.check {
                let re = Regex::new(pattern).map_err(|e| RegistryError::InvalidRule {
                    rule_id: rule.id.clone(),
                    reason: format!("invalid pattern {pattern}: {e}"),
                })?;
                rule.check = Check::Pattern(re);
            }
            checked.push(rule);
        }

        tracing::debug!(rules = checked.len(), "Validation engine ready");
        Ok(Self {
            registry,
            rules: checked,
        })
    }

    /// Engine with the standard rule catalog
    pub fn standard(registry: Arc<TemplateRegistry>) -> std::result::Result<Self, RegistryError> {
        let rules = catalog::standard_rules(&registry);
        Self::new(registry, rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_counts(&self) -> BTreeMap<RuleCategory, usize> {
        let mut counts = BTreeMap::new();
        for rule in &self.rules {
            *counts.entry(rule.category).or_insert(0) += 1;
        }
        counts
    }

    fn is_intra(rule: &Rule) -> bool {
        rule.category.is_intra_template()
            && matches!(
                rule.check,
                Check::Format(_) | Check::Pattern(_) | Check::Required | Check::Relation(_)
            )
    }

    /// Format, required and business rules of one template
    pub fn validate_relation(&self, relation: &Relation, ctx: &RuleContext) -> Vec<ValidationFinding> {
        let mut findings: Vec<ValidationFinding> = self
            .rules
            .iter()
            .filter(|rule| rule.template == relation.code() && Self::is_intra(rule))
            .flat_map(|rule| {
                self.evaluate(rule, relation, None, ctx)
                    .into_iter()
                    .map(move |v| finding(rule, v))
            })
            .collect();
        findings.sort();
        findings
    }

    /// Referential and aggregate rules. Rules reading a template that was
    /// not built in this run are skipped.
    pub fn validate_cross(&self, relations: &RelationSet, ctx: &RuleContext) -> Vec<ValidationFinding> {
        let mut findings: Vec<ValidationFinding> = self
            .rules
            .iter()
            .filter(|rule| !Self::is_intra(rule))
            .filter(|rule| {
                rule.required_templates()
                    .iter()
                    .all(|code| relations.contains(*code))
            })
            .flat_map(|rule| {
                let violations = match relations.get(rule.template) {
                    Some(relation) => self.evaluate(rule, relation, Some(relations), ctx),
                    None => Vec::new(),
                };
                violations.into_iter().map(move |v| finding(rule, v))
            })
            .collect();
        findings.sort();
        findings
    }

    /// Every rule against a relation set, sequentially
    pub fn validate(&self, relations: &RelationSet, ctx: &RuleContext) -> Vec<ValidationFinding> {
        let mut findings: Vec<ValidationFinding> = relations
            .iter()
            .flat_map(|(_, relation)| self.validate_relation(relation, ctx))
            .collect();
        findings.extend(self.validate_cross(relations, ctx));
        findings.sort();
        findings
    }

    /// Runs the per-template rules on blocking workers for every relation
    /// received, until the sender side closes
    pub async fn validate_incoming(
        self: Arc<Self>,
        mut incoming: UnboundedReceiver<Arc<Relation>>,
        ctx: RuleContext,
    ) -> Result<Vec<ValidationFinding>> {
        let mut tasks = JoinSet::new();
        while let Some(relation) = incoming.recv().await {
            let engine = Arc::clone(&self);
            tasks.spawn_blocking(move || engine.validate_relation(&relation, &ctx));
        }

        let mut findings = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            findings.extend(
                joined.map_err(|e| RoiError::Other(format!("Validation task failed: {e}")))?,
            );
        }
        findings.sort();
        Ok(findings)
    }

    fn field_name(&self, template: TemplateCode, field: &str) -> &'static str {
        self.registry
            .get(template)
            .and_then(|d| d.field(field))
            .map_or("", |f| f.name)
    }

    fn evaluate(
        &self,
        rule: &Rule,
        relation: &Relation,
        relations: Option<&RelationSet>,
        ctx: &RuleContext,
    ) -> Vec<Violation> {
        let field = rule.field();
        match (&rule.check, field) {
            (Check::Format(format), Some(field)) => relation
                .rows()
                .flat_map(|row| {
                    format_violations(format, row.get(field))
                        .into_iter()
                        .map(move |bad| {
                            Violation::at(
                                row.index(),
                                field,
                                format!("'{bad}' is not a valid {}", format.describe()),
                            )
                        })
                })
                .collect(),
            (Check::Pattern(re), Some(field)) => relation
                .rows()
                .filter_map(|row| {
                    let value = row.text(field).filter(|s| !s.trim().is_empty())?;
                    (!re.is_match(value)).then(|| {
                        Violation::at(
                            row.index(),
                            field,
                            format!("'{value}' does not match {}", re.as_str()),
                        )
                    })
                })
                .collect(),
            (Check::Required, Some(field)) => {
                let name = self.field_name(rule.template, field);
                let kind = match self
                    .registry
                    .get(rule.template)
                    .and_then(|d| d.field(field))
                    .map(|f| f.presence)
                {
                    Some(Presence::Recommended) => "Recommended",
                    _ => "Mandatory",
                };
                relation
                    .rows()
                    .filter(|row| row.get(field).is_empty())
                    .map(|row| {
                        Violation::at(row.index(), field, format!("{kind} field '{name}' is empty"))
                    })
                    .collect()
            }
            (
                Check::References {
                    target,
                    target_field,
                },
                Some(field),
            ) => {
                let Some(target_relation) = relations.and_then(|r| r.get(*target)) else {
                    return Vec::new();
                };
                let keys = target_relation.key_set(target_field);
                relation
                    .rows()
                    .filter_map(|row| {
                        let value = row.text(field).filter(|s| !s.trim().is_empty())?;
                        (!keys.contains(value)).then(|| {
                            Violation::at(
                                row.index(),
                                field,
                                format!("'{value}' has no matching {target_field} in {target}"),
                            )
                        })
                    })
                    .collect()
            }
            (Check::Relation(check), _) => check(relation, ctx),
            (Check::Cross(check), _) => relations.map(|r| check(r, ctx)).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

fn finding(rule: &Rule, violation: Violation) -> ValidationFinding {
    ValidationFinding {
        template: rule.template,
        field: violation.field.or(rule.field()).map(str::to_string),
        row: violation.row,
        rule_id: rule.id.clone(),
        category: rule.category,
        severity: rule.severity,
        message: violation.message,
    }
}

fn check_targets(registry: &TemplateRegistry, rule: &Rule) -> std::result::Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidRule {
        rule_id: rule.id.clone(),
        reason,
    };

    let descriptor = registry
        .get(rule.template)
        .ok_or_else(|| invalid(format!("template {} is not registered", rule.template)))?;

    if let RuleTarget::Field(field) = rule.target {
        if descriptor.field(field).is_none() {
            return Err(invalid(format!("{} has no field {field}", rule.template)));
        }
    }

    match (&rule.target, &rule.check) {
        (RuleTarget::Field(_), Check::Format(_) | Check::Pattern(_) | Check::Required)
        | (RuleTarget::Field(_), Check::References { .. })
        | (_, Check::Relation(_))
        | (RuleTarget::CrossTemplate(_), Check::Cross(_)) => {}
        (target, _) => {
            return Err(invalid(format!("check does not apply to target {target:?}")));
        }
    }

    if let Check::References {
        target,
        target_field,
    } = &rule.check
    {
        let target_descriptor = registry
            .get(*target)
            .ok_or_else(|| invalid(format!("referenced template {target} is not registered")))?;
        if target_descriptor.field(target_field).is_none() {
            return Err(invalid(format!("{target} has no field {target_field}")));
        }
    }

    if let RuleTarget::CrossTemplate(others) = &rule.target {
        if let Some(missing) = others.iter().find(|code| !registry.contains(**code)) {
            return Err(invalid(format!("template {missing} is not registered")));
        }
    }

    Ok(())
}
