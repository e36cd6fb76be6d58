//! B_05.x: ICT third-party providers and their supply chains

use super::find_row;
use crate::core::registry::vocabulary::{
    PERSON_TYPE, PROVIDER_ID_TYPE, PROVIDER_TYPE, SERVICE_TYPE,
};
use crate::core::registry::{BuildContext, FieldFormat, FieldSpec, FieldType, TemplateDescriptor};
use crate::core::relation::{Row, Value};
use crate::domain::{Provider, SourceKind, Subcontractor, TemplateCode};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const PROVIDERS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_05_01,
    title: "ICT third-party service providers",
    fields: &[
        FieldSpec::mandatory("c0010", "Provider identification code", FieldType::Text),
        FieldSpec::mandatory("c0020", "Type of code", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&PROVIDER_ID_TYPE)),
        FieldSpec::mandatory("c0030", "Name of the provider", FieldType::Text),
        FieldSpec::optional("c0040", "Name in Latin alphabet", FieldType::Text),
        FieldSpec::mandatory("c0050", "Type of person", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&PERSON_TYPE)),
        FieldSpec::mandatory("c0060", "Country of headquarters", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::mandatory("c0070", "Currency", FieldType::Text)
            .with_format(FieldFormat::Currency),
        FieldSpec::optional(
            "c0080",
            "Total annual expense",
            FieldType::Decimal { scale: 2 },
        ),
        FieldSpec::optional("c0090", "Direct parent provider code", FieldType::Text),
        FieldSpec::optional("c0100", "Ultimate parent provider code", FieldType::Text),
        FieldSpec::mandatory("c0110", "Type of provider", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&PROVIDER_TYPE)),
        FieldSpec::mandatory("c0120", "Intra-group provider", FieldType::Boolean),
    ],
    dependencies: &[],
    sources: &[SourceKind::Providers, SourceKind::Contracts],
    build: build_providers,
};

pub const SUPPLY_CHAINS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_05_02,
    title: "ICT service supply chains",
    fields: &[
        FieldSpec::mandatory("c0010", "Contractual arrangement reference", FieldType::Text),
        FieldSpec::mandatory("c0020", "Type of ICT service", FieldType::Text)
            .with_format(FieldFormat::Vocabulary(&SERVICE_TYPE)),
        FieldSpec::mandatory("c0030", "Subcontractor identification code", FieldType::Text),
        FieldSpec::mandatory("c0040", "Name of the subcontractor", FieldType::Text),
        FieldSpec::mandatory("c0050", "Country of the subcontractor", FieldType::Text)
            .with_format(FieldFormat::Country),
        FieldSpec::mandatory("c0060", "Rank in the supply chain", FieldType::Integer),
        FieldSpec::mandatory("c0070", "Recipient of sub-contracted services", FieldType::Text),
    ],
    dependencies: &[TemplateCode::B_02_02, TemplateCode::B_05_01],
    sources: &[SourceKind::Subcontractors],
    build: build_supply_chains,
};

/// Top of the parent chain of a provider
///
/// A parent that is not a known provider ends the walk and is itself the
/// ultimate parent. A cycle yields `None`; it is reported by validation.
pub fn ultimate_parent(providers: &HashMap<&str, &Provider>, provider: &Provider) -> Option<String> {
    let mut visited = HashSet::from([provider.id.as_str()]);
    let mut current = provider;
    while let Some(parent_id) = current.parent_id.as_deref() {
        if !visited.insert(parent_id) {
            return None;
        }
        match providers.get(parent_id) {
            Some(parent) => current = *parent,
            None => return Some(parent_id.to_string()),
        }
    }
    (current.id != provider.id).then(|| current.id.clone())
}

/// Provider at the root of a subcontracting chain, `None` on a broken or
/// cyclic chain
pub fn chain_root<'a>(
    subcontractors: &HashMap<&str, &'a Subcontractor>,
    subcontractor: &'a Subcontractor,
) -> Option<&'a str> {
    let mut visited = HashSet::new();
    let mut current = subcontractor;
    loop {
        if !visited.insert(current.id.as_str()) {
            return None;
        }
        if let Some(provider_id) = current.provider_id.as_deref() {
            return Some(provider_id);
        }
        current = *subcontractors.get(current.parent_id.as_deref()?)?;
    }
}

fn build_providers(ctx: &BuildContext<'_>) -> Vec<Row> {
    let by_id: HashMap<&str, &Provider> = ctx
        .sources
        .providers
        .iter()
        .map(|p| (p.id.as_str(), p))
        .collect();

    let mut expenses: HashMap<&str, Decimal> = HashMap::new();
    for contract in &ctx.sources.contracts {
        if let Some(cost) = contract.annual_cost {
            *expenses.entry(contract.provider_id.as_str()).or_default() += cost;
        }
    }

    ctx.sources
        .providers
        .iter()
        .map(|p| {
            vec![
                Value::text(&p.id),
                Value::text(&p.id_type),
                Value::text(&p.name),
                Value::opt_text(p.name_latin.clone()),
                Value::text(&p.person_type),
                Value::text(&p.country),
                Value::text(&p.currency),
                Value::opt_decimal(expenses.get(p.id.as_str()).copied()),
                Value::opt_text(p.parent_id.clone()),
                Value::opt_text(ultimate_parent(&by_id, p)),
                Value::text(&p.classification),
                Value::Boolean(p.intra_group),
            ]
        })
        .collect()
}

/// One row per subcontractor and arrangement. A subcontractor linked to a
/// service follows that service's arrangement; otherwise it inherits every
/// arrangement of the provider at the root of its chain.
fn build_supply_chains(ctx: &BuildContext<'_>) -> Vec<Row> {
    let specific = ctx.relation(TemplateCode::B_02_02);
    let by_id: HashMap<&str, &Subcontractor> = ctx
        .sources
        .subcontractors
        .iter()
        .map(|s| (s.id.as_str(), s))
        .collect();

    let mut rows = Vec::new();
    for sub in &ctx.sources.subcontractors {
        let recipient = match (sub.parent_id.as_deref(), sub.provider_id.as_deref()) {
            (Some(parent), _) => Some(parent),
            (None, provider) => provider,
        };

        let arrangements: Vec<(Value, Value)> = match sub.service_id.as_deref() {
            Some(service_id) => find_row(specific, "c0020", service_id)
                .map(|row| vec![(row.get("c0010").clone(), row.get("c0060").clone())])
                .unwrap_or_default(),
            None => {
                let root = chain_root(&by_id, sub);
                let mut seen = BTreeSet::new();
                specific
                    .into_iter()
                    .flat_map(|r| r.rows())
                    .filter(|row| root.is_some() && row.text("c0040") == root)
                    .filter(|row| seen.insert(row.text("c0010")))
                    .map(|row| (row.get("c0010").clone(), row.get("c0060").clone()))
                    .collect()
            }
        };
        let arrangements = if arrangements.is_empty() {
            vec![(Value::Null, Value::Null)]
        } else {
            arrangements
        };

        for (contract, service_type) in arrangements {
            rows.push(vec![
                contract,
                service_type,
                Value::text(&sub.id),
                Value::text(&sub.name),
                Value::text(&sub.country),
                Value::Integer(sub.tier),
                Value::opt_text(recipient),
            ]);
        }
    }
    rows
}
