//! B_02.x, B_03.x and B_04.01: contractual arrangements and their parties

use super::{find_row, REFERENCE_PATTERN};
use crate::core::registry::vocabulary::{
    sensitivity_rank, CONTRACT_TYPE, CRITICALITY, LOCATION_TYPE, SENSITIVITY, SERVICE_TYPE,
    TERMINATION_REASON,
};
use crate::core::registry::{BuildContext, FieldFormat, FieldSpec, FieldType, TemplateDescriptor};
use crate::core::relation::{Row, Value};
use crate::domain::{DataLocation, SourceKind, TemplateCode};

const DEC2: FieldType = FieldType::Decimal { scale: 2 };

pub const ARRANGEMENTS_GENERAL: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_02_01,
    title: "Contractual arrangements - general information",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text)
            .with_format(FieldFormat::Pattern(REFERENCE_PATTERN)),
        FieldSpec::mandatory("c0020", "Type of contractual arrangement", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&CONTRACT_TYPE)),
        FieldSpec::optional("c0030", "Overarching arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0040", "Currency", FieldType::Text)
            .with_format(FieldFormat::Currency),
        FieldSpec::optional("c0050", "Annual expense", DEC2),
        FieldSpec::mandatory("c0060", "Start date", FieldType::Date),
        FieldSpec::optional("c0070", "End date", FieldType::Date),
        FieldSpec::mandatory("c0080", "Provider identification code", FieldType::Text),
        FieldSpec::mandatory("c0090", "LEI of the entity signing", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0100", "Governing law country", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::optional("c0110", "Notice period for the entity (days)", FieldType::Integer),
        FieldSpec::optional("c0120", "Notice period for the provider (days)", FieldType::Integer),
        FieldSpec::optional("c0130", "Reason of termination", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&TERMINATION_REASON)),
        FieldSpec::optional("c0140", "Branch making use of the arrangement", FieldType::Text),
    ],
    dependencies: &[TemplateCode::B_05_01],
    sources: &[SourceKind::Contracts],
    build: build_general,
};

pub const ARRANGEMENTS_SPECIFIC: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_02_02,
    title: "Contractual arrangements - specific information",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "ICT service identifier", FieldType::Text),
        FieldSpec::optional("c0030", "LEI of the entity making use", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::optional("c0040", "Provider identification code", FieldType::Text),
        FieldSpec::optional("c0050", "Function identifier", FieldType::Text),
        FieldSpec::mandatory("c0060", "Type of ICT service", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&SERVICE_TYPE)),
        FieldSpec::optional("c0070", "Start date", FieldType::Date),
        FieldSpec::optional("c0080", "End date", FieldType::Date),
        FieldSpec::optional("c0090", "Notice period for the entity (days)", FieldType::Integer),
        FieldSpec::optional("c0100", "Notice period for the provider (days)", FieldType::Integer),
        FieldSpec::optional("c0110", "Governing law country", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::mandatory("c0120", "Country of provision", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::mandatory("c0130", "Storage of data", FieldType::Boolean),
        FieldSpec::optional("c0140", "Location of data", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::optional("c0150", "Type of data location", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&LOCATION_TYPE)),
        FieldSpec::optional("c0160", "Sensitiveness of data", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&SENSITIVITY)),
        FieldSpec::mandatory("c0170", "Level of reliance", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&CRITICALITY)),
        FieldSpec::optional("c0180", "Availability target (%)", DEC2),
        FieldSpec::optional("c0190", "Recovery time objective (minutes)", FieldType::Integer),
        FieldSpec::optional("c0200", "Recovery point objective (minutes)", FieldType::Integer),
        FieldSpec::mandatory("c0210", "Personal data processed", FieldType::Boolean),
        FieldSpec::optional("c0220", "Categories of data", FieldType::List),
    ],
    dependencies: &[
        TemplateCode::B_01_02,
        TemplateCode::B_02_01,
        TemplateCode::B_05_01,
        TemplateCode::B_06_01,
    ],
    sources: &[
        SourceKind::Services,
        SourceKind::DataLocations,
        SourceKind::CriticalFunctions,
    ],
    build: build_specific,
};

pub const LINKED_ARRANGEMENTS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_02_03,
    title: "List of intra-group contractual arrangements",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "Overarching arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0030", "Type of link", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&CONTRACT_TYPE)),
    ],
    dependencies: &[TemplateCode::B_02_01],
    sources: &[],
    build: build_linked,
};

pub const SIGNING_ENTITIES: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_03_01,
    title: "Entities signing the contractual arrangements",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "LEI of the entity signing", FieldType::Text)
            .with_format(FieldFormat::Lei),
    ],
    dependencies: &[TemplateCode::B_01_02, TemplateCode::B_02_01],
    sources: &[],
    build: build_signing_entities,
};

pub const SIGNING_PROVIDERS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_03_02,
    title: "ICT third-party service providers signing the arrangements",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "Provider identification code", FieldType::Text),
        FieldSpec::mandatory("c0030", "Type of provider code", FieldType::Text),
    ],
    dependencies: &[TemplateCode::B_02_01, TemplateCode::B_05_01],
    sources: &[],
    build: build_signing_providers,
};

pub const INTRA_GROUP_PROVIDERS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_03_03,
    title: "Entities providing ICT services within the group",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "LEI of the providing entity", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0030", "Name of the providing entity", FieldType::Text),
    ],
    dependencies: &[TemplateCode::B_01_02, TemplateCode::B_02_01],
    sources: &[],
    build: build_intra_group,
};

pub const USING_ENTITIES: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_04_01,
    title: "Entities making use of the ICT services",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "LEI of the entity making use", FieldType::Text)
            .with_format(FieldFormat::Lei),
        FieldSpec::mandatory("c0030", "Nature of the entity (branch)", FieldType::Boolean),
        FieldSpec::optional("c0040", "Branch identification code", FieldType::Text),
    ],
    dependencies: &[TemplateCode::B_01_03, TemplateCode::B_02_01],
    sources: &[],
    build: build_using_entities,
};

fn build_general(ctx: &BuildContext<'_>) -> Vec<Row> {
    ctx.sources
        .contracts
        .iter()
        .map(|c| {
            vec![
                Value::text(&c.reference),
                Value::text(&c.contract_type),
                Value::opt_text(c.overarching_reference.clone()),
                Value::text(&c.currency),
                Value::opt_decimal(c.annual_cost),
                Value::Date(c.effective_date),
                Value::opt_date(c.expiry_date),
                Value::text(&c.provider_id),
                Value::text(&c.entity_lei),
                Value::text(&c.governing_law_country),
                Value::opt_integer(c.notice_period_entity_days),
                Value::opt_integer(c.notice_period_provider_days),
                Value::opt_text(c.termination_reason.clone()),
                Value::opt_text(c.using_branch.clone()),
            ]
        })
        .collect()
}

/// Most sensitive data location of a service; ties keep the lowest id
fn primary_location<'a>(locations: &'a [DataLocation], service_id: &str) -> Option<&'a DataLocation> {
    locations
        .iter()
        .filter(|l| l.service_id == service_id)
        .fold(None, |best: Option<&DataLocation>, l| match best {
            Some(b) if sensitivity_rank(&b.sensitivity) >= sensitivity_rank(&l.sensitivity) => {
                Some(b)
            }
            _ => Some(l),
        })
}

/// One row per service and supported function. A service supporting no
/// function yields a single row with an empty function identifier. Services
/// whose contract is missing from B_02.01 are kept so the dangling reference
/// is reported.
fn build_specific(ctx: &BuildContext<'_>) -> Vec<Row> {
    let contracts = ctx.relation(TemplateCode::B_02_01);
    let mut rows = Vec::new();

    for service in &ctx.sources.services {
        let contract = find_row(contracts, "c0010", &service.contract_reference);
        let contract_value =
            |field: &str| contract.map_or(Value::Null, |row| row.get(field).clone());
        let location = primary_location(&ctx.sources.data_locations, &service.id);

        let mut function_ids: Vec<&str> = ctx
            .sources
            .functions
            .iter()
            .filter(|f| f.service_ids.iter().any(|s| *s == service.id))
            .map(|f| f.id.as_str())
            .collect();
        if function_ids.is_empty() {
            function_ids.push("");
        }

        for function_id in function_ids {
            rows.push(vec![
                Value::text(&service.contract_reference),
                Value::text(&service.id),
                contract_value("c0090"),
                contract_value("c0080"),
                if function_id.is_empty() {
                    Value::Null
                } else {
                    Value::text(function_id)
                },
                Value::text(&service.classification),
                contract_value("c0060"),
                contract_value("c0070"),
                contract_value("c0110"),
                contract_value("c0120"),
                contract_value("c0100"),
                Value::text(&service.country_of_provision),
                Value::Boolean(location.is_some()),
                Value::opt_text(location.map(|l| l.country.clone())),
                Value::opt_text(location.map(|l| l.location_type.clone())),
                Value::opt_text(location.map(|l| l.sensitivity.clone())),
                Value::text(&service.criticality),
                Value::opt_decimal(service.availability_target),
                Value::opt_integer(service.recovery_time_minutes),
                Value::opt_integer(service.recovery_point_minutes),
                Value::Boolean(service.personal_data),
                Value::List(service.data_categories.clone()),
            ]);
        }
    }

    rows
}

fn build_linked(ctx: &BuildContext<'_>) -> Vec<Row> {
    let Some(contracts) = ctx.relation(TemplateCode::B_02_01) else {
        return Vec::new();
    };
    contracts
        .rows()
        .filter(|row| !row.get("c0030").is_empty())
        .map(|row| {
            vec![
                row.get("c0010").clone(),
                row.get("c0030").clone(),
                row.get("c0020").clone(),
            ]
        })
        .collect()
}

fn build_signing_entities(ctx: &BuildContext<'_>) -> Vec<Row> {
    let (Some(contracts), Some(entities)) = (
        ctx.relation(TemplateCode::B_02_01),
        ctx.relation(TemplateCode::B_01_02),
    ) else {
        return Vec::new();
    };
    let in_scope = entities.key_set("c0010");
    contracts
        .rows()
        .filter(|row| row.text("c0090").is_some_and(|lei| in_scope.contains(lei)))
        .map(|row| vec![row.get("c0010").clone(), row.get("c0090").clone()])
        .collect()
}

fn build_signing_providers(ctx: &BuildContext<'_>) -> Vec<Row> {
    let Some(contracts) = ctx.relation(TemplateCode::B_02_01) else {
        return Vec::new();
    };
    let providers = ctx.relation(TemplateCode::B_05_01);
    contracts
        .rows()
        .filter_map(|row| {
            let provider = find_row(providers, "c0010", row.text("c0080")?)?;
            Some(vec![
                row.get("c0010").clone(),
                provider.get("c0010").clone(),
                provider.get("c0020").clone(),
            ])
        })
        .collect()
}

fn build_intra_group(ctx: &BuildContext<'_>) -> Vec<Row> {
    let Some(contracts) = ctx.relation(TemplateCode::B_02_01) else {
        return Vec::new();
    };
    let entities = ctx.relation(TemplateCode::B_01_02);
    contracts
        .rows()
        .filter_map(|row| {
            let entity = find_row(entities, "c0010", row.text("c0080")?)?;
            Some(vec![
                row.get("c0010").clone(),
                entity.get("c0010").clone(),
                entity.get("c0020").clone(),
            ])
        })
        .collect()
}

fn build_using_entities(ctx: &BuildContext<'_>) -> Vec<Row> {
    let Some(contracts) = ctx.relation(TemplateCode::B_02_01) else {
        return Vec::new();
    };
    contracts
        .rows()
        .map(|row| {
            let branch = row.get("c0140");
            vec![
                row.get("c0010").clone(),
                row.get("c0090").clone(),
                Value::Boolean(!branch.is_empty()),
                branch.clone(),
            ]
        })
        .collect()
}
