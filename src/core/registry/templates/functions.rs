//! B_06.01 and B_07.01: critical functions and the assessment of services

use super::{find_row, REFERENCE_PATTERN};
use crate::core::registry::vocabulary::{FRAMEWORK, IMPACT, SERVICE_TYPE, SUBSTITUTABILITY};
use crate::core::registry::{BuildContext, FieldFormat, FieldSpec, FieldType, TemplateDescriptor};
use crate::core::relation::{Row, Value};
use crate::domain::{SourceKind, TemplateCode};
use std::collections::BTreeSet;

pub const FUNCTIONS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_06_01,
    title: "Functions identification",
    fields: &[
        FieldSpec::mandatory("c0010", "Function identifier", FieldType::Text)
            .with_format(FieldFormat::Pattern(REFERENCE_PATTERN)),
        FieldSpec::mandatory("c0020", "Function name", FieldType::Text),
        FieldSpec::optional("c0030", "Licensed activity", FieldType::Text),
        FieldSpec::mandatory("c0040", "LEI of the entity", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0050", "Criticality or importance", FieldType::Boolean),
        FieldSpec::optional("c0060", "Reasons for criticality", FieldType::Text),
        FieldSpec::optional("c0070", "Assessment framework", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&FRAMEWORK)),
        FieldSpec::optional("c0080", "Date of the last assessment", FieldType::Date),
        FieldSpec::optional("c0090", "Recovery time objective (minutes)", FieldType::Integer),
        FieldSpec::optional("c0100", "Recovery point objective (minutes)", FieldType::Integer),
        FieldSpec::optional("c0110", "Impact of discontinuing the function", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&IMPACT)),
    ],
    dependencies: &[TemplateCode::B_01_02],
    sources: &[SourceKind::CriticalFunctions],
    build: build_functions,
};

pub const SERVICE_ASSESSMENTS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_07_01,
    title: "Assessment of the ICT services",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::optional("c0020", "Provider identification code", FieldType::Text),
        FieldSpec::mandatory("c0030", "Type of ICT service", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&SERVICE_TYPE)),
        FieldSpec::mandatory("c0040", "Substitutability", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&SUBSTITUTABILITY)),
        FieldSpec::mandatory("c0050", "Existence of an exit plan", FieldType::Boolean),
        FieldSpec::optional("c0060", "Possibility of reintegration", FieldType::Boolean),
        FieldSpec::recommended("c0070", "Date of the last audit", FieldType::Date),
        FieldSpec::optional("c0080", "Number of alternative providers", FieldType::Integer),
        FieldSpec::mandatory("c0090", "ICT service identifier", FieldType::Text),
    ],
    dependencies: &[TemplateCode::B_02_02],
    sources: &[SourceKind::Services],
    build: build_service_assessments,
};

fn build_functions(ctx: &BuildContext<'_>) -> Vec<Row> {
    ctx.sources
        .functions
        .iter()
        .map(|f| {
            let assessment = f.assessment.as_ref();
            vec![
                Value::text(&f.id),
                Value::text(&f.name),
                Value::opt_text(f.licensed_activity.clone()),
                Value::text(&f.entity_lei),
                Value::Boolean(f.is_critical),
                Value::opt_text(assessment.and_then(|a| a.summary())),
                Value::opt_text(assessment.map(|a| a.framework())),
                Value::opt_date(assessment.and_then(|a| a.assessed_on())),
                Value::opt_integer(f.recovery_time_minutes),
                Value::opt_integer(f.recovery_point_minutes),
                Value::opt_text(assessment.and_then(|a| a.impact())),
            ]
        })
        .collect()
}

/// One row per distinct service of B_02.02, in service order
fn build_service_assessments(ctx: &BuildContext<'_>) -> Vec<Row> {
    let Some(specific) = ctx.relation(TemplateCode::B_02_02) else {
        return Vec::new();
    };

    let service_ids: BTreeSet<&str> = specific.key_set("c0020");
    service_ids
        .into_iter()
        .filter_map(|service_id| {
            let row = find_row(Some(specific), "c0020", service_id)?;
            let service = ctx.sources.services.iter().find(|s| s.id == service_id)?;
            Some(vec![
                row.get("c0010").clone(),
                row.get("c0040").clone(),
                row.get("c0060").clone(),
                Value::opt_text(service.substitutability.clone()),
                Value::Boolean(service.exit_plan),
                Value::opt_boolean(service.reintegration_possible),
                Value::opt_date(service.last_audit_date),
                Value::opt_integer(service.alternative_providers),
                Value::text(service_id),
            ])
        })
        .collect()
}
