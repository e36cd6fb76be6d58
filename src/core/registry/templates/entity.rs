//! B_01.x: the reporting entity, the entities in scope and their branches

use super::REFERENCE_PATTERN;
use crate::core::registry::vocabulary::ENTITY_TYPE;
use crate::core::registry::{BuildContext, FieldFormat, FieldSpec, FieldType, TemplateDescriptor};
use crate::core::relation::{Row, Value};
use crate::domain::{SourceKind, TemplateCode};

const DEC2: FieldType = FieldType::Decimal { scale: 2 };

pub const ENTITY_MAINTAINING_REGISTER: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_01_01,
    title: "Entity maintaining the register of information",
    fields: &[
        FieldSpec::mandatory("c0010", "LEI of the entity", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0020", "Name of the entity", FieldType::Text),
        FieldSpec::mandatory("c0030", "Country of the entity", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::mandatory("c0040", "Type of entity", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&ENTITY_TYPE)),
        FieldSpec::mandatory("c0050", "Competent authority", FieldType::Text),
        FieldSpec::mandatory("c0060", "Reporting currency", FieldType::Text)
            .with_format(FieldFormat::Currency),
        FieldSpec::mandatory("c0070", "Reporting date", FieldType::Date),
        FieldSpec::recommended("c0080", "Responsible person", FieldType::Text),
        FieldSpec::recommended("c0090", "Contact e-mail", FieldType::Text)
            .with_format(FieldFormat::Email),
    ],
    dependencies: &[],
    sources: &[SourceKind::ReportingEntity],
    build: build_entity,
};

pub const ENTITIES_IN_SCOPE: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_01_02,
    title: "List of entities within the scope of the register",
    fields: &[
        FieldSpec::mandatory("c0010", "LEI of the entity", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0020", "Name of the entity", FieldType::Text),
        FieldSpec::mandatory("c0030", "Country of the entity", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::mandatory("c0040", "Type of entity", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&ENTITY_TYPE)),
        FieldSpec::optional("c0050", "LEI of the direct parent", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0060", "Currency", FieldType::Text)
            .with_format(FieldFormat::Currency),
        FieldSpec::optional("c0070", "Total assets", DEC2),
    ],
    dependencies: &[TemplateCode::B_01_01],
    sources: &[SourceKind::ReportingEntity],
    build: build_entities_in_scope,
};

pub const BRANCHES: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_01_03,
    title: "List of branches",
    fields: &[
        FieldSpec::mandatory("c0010", "Branch identification code", FieldType::Text)
            .with_format(FieldFormat::Pattern(REFERENCE_PATTERN)),
        FieldSpec::mandatory("c0020", "LEI of the head office", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0030", "Name of the branch", FieldType::Text),
        FieldSpec::mandatory("c0040", "Country of the branch", FieldType::Text)
            .with_format(FieldFormat::Country),
    ],
    dependencies: &[TemplateCode::B_01_02],
    sources: &[SourceKind::ReportingEntity],
    build: build_branches,
};

fn build_entity(ctx: &BuildContext<'_>) -> Vec<Row> {
    let entity = &ctx.sources.entity;
    let contact = entity.responsible_persons.first();

    vec![vec![
        Value::text(&entity.lei),
        Value::text(&entity.name),
        Value::text(&entity.country),
        Value::text(&entity.entity_type),
        Value::text(&entity.competent_authority),
        Value::text(&entity.currency),
        Value::Date(ctx.reporting_date),
        Value::opt_text(contact.map(|p| p.name.clone())),
        Value::opt_text(contact.and_then(|p| p.email.clone())),
    ]]
}

/// The reporting entity followed by its group entities, ordered by LEI
fn build_entities_in_scope(ctx: &BuildContext<'_>) -> Vec<Row> {
    let entity = &ctx.sources.entity;
    let mut rows: Vec<Row> = Vec::with_capacity(entity.group_entities.len() + 1);

    if let Some(head) = ctx
        .relation(TemplateCode::B_01_01)
        .and_then(|r| r.rows().next())
    {
        rows.push(vec![
            head.get("c0010").clone(),
            head.get("c0020").clone(),
            head.get("c0030").clone(),
            head.get("c0040").clone(),
            Value::Null,
            head.get("c0060").clone(),
            Value::opt_decimal(entity.total_assets),
        ]);
    }

    rows.extend(
        entity
            .group_entities
            .iter()
            .filter(|g| g.lei != entity.lei)
            .map(|g| {
                vec![
                    Value::text(&g.lei),
                    Value::text(&g.name),
                    Value::text(&g.country),
                    Value::text(&g.entity_type),
                    Value::opt_text(g.parent_lei.clone()),
                    Value::text(&g.currency),
                    Value::opt_decimal(g.total_assets),
                ]
            }),
    );

    rows.sort_by(|a, b| a[0].as_text().cmp(&b[0].as_text()));
    rows
}

fn build_branches(ctx: &BuildContext<'_>) -> Vec<Row> {
    let entity = &ctx.sources.entity;
    entity
        .branches
        .iter()
        .map(|b| {
            vec![
                Value::text(&b.code),
                Value::text(b.head_office_lei.as_deref().unwrap_or(&entity.lei)),
                Value::text(&b.name),
                Value::text(&b.country),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{self, ENTITY_LEI, SUBSIDIARY_LEI};
    use crate::core::relation::Value;
    use crate::domain::TemplateCode;

    #[test]
    fn test_entity_row_carries_reporting_date() {
        let relations = fixtures::build_all(&fixtures::snapshot());
        let entity = relations.get(TemplateCode::B_01_01).unwrap();
        assert_eq!(entity.len(), 1);
        let row = entity.row(0);
        assert_eq!(row.text("c0010"), Some(ENTITY_LEI));
        assert_eq!(row.date("c0070"), Some(fixtures::reporting_date()));
        assert_eq!(row.text("c0090"), Some("jane.roe@acme.example"));
    }

    #[test]
    fn test_entities_in_scope_sorted_by_lei() {
        let relations = fixtures::build_all(&fixtures::snapshot());
        let scope = relations.get(TemplateCode::B_01_02).unwrap();
        let leis: Vec<_> = scope.rows().filter_map(|r| r.text("c0010")).collect();
        assert_eq!(leis, vec![SUBSIDIARY_LEI, ENTITY_LEI]);
        assert_eq!(scope.row(1).get("c0050"), &Value::Null);
        assert_eq!(scope.row(0).text("c0050"), Some(ENTITY_LEI));
    }

    #[test]
    fn test_branch_defaults_head_office_to_reporting_entity() {
        let relations = fixtures::build_all(&fixtures::snapshot());
        let branches = relations.get(TemplateCode::B_01_03).unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches.row(0).text("c0020"), Some(ENTITY_LEI));
    }
}
