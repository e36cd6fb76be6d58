//! Standard rule catalog
//!
//! Format and required rules are generated from the field schemas of the
//! registered templates. The conditional, business, referential and
//! aggregate rules below are written out by hand.

use crate::core::registry::{Presence, TemplateRegistry};
use crate::core::relation::Relation;
use crate::core::serialize::codec::is_list_item;
use crate::core::validation::checks::provider_id_matches;
use crate::core::validation::rule::{Rule, RuleTarget, Violation};
use crate::domain::{RuleCategory, Severity, TemplateCode};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

const B_01_02: TemplateCode = TemplateCode::B_01_02;
const B_01_03: TemplateCode = TemplateCode::B_01_03;
const B_02_01: TemplateCode = TemplateCode::B_02_01;
const B_02_02: TemplateCode = TemplateCode::B_02_02;
const B_02_03: TemplateCode = TemplateCode::B_02_03;
const B_04_01: TemplateCode = TemplateCode::B_04_01;
const B_05_01: TemplateCode = TemplateCode::B_05_01;
const B_05_02: TemplateCode = TemplateCode::B_05_02;
const B_06_01: TemplateCode = TemplateCode::B_06_01;

/// Every rule of the standard register that applies to `registry`.
/// Hand-written rules whose templates are not registered are left out.
pub fn standard_rules(registry: &TemplateRegistry) -> Vec<Rule> {
    let mut rules = schema_rules(registry);
    rules.extend(
        conditional_rules()
            .into_iter()
            .chain(format_rules())
            .chain(business_rules())
            .chain(referential_rules())
            .chain(aggregate_rules())
            .filter(|rule| {
                rule.required_templates()
                    .iter()
                    .all(|code| registry.contains(*code))
            }),
    );
    rules
}

/// Format and presence rules derived from the field schemas
pub fn schema_rules(registry: &TemplateRegistry) -> Vec<Rule> {
    let mut rules = Vec::new();
    for descriptor in registry.descriptors() {
        for field in descriptor.fields {
            if let Some(format) = field.format {
                rules.push(Rule::format(descriptor.code, field.code, format));
            }
            match field.presence {
                Presence::Mandatory => {
                    rules.push(Rule::required(descriptor.code, field.code, Severity::Error))
                }
                Presence::Recommended => {
                    rules.push(Rule::required(descriptor.code, field.code, Severity::Warning))
                }
                Presence::Optional => {}
            }
        }
    }
    rules
}

fn format_rules() -> Vec<Rule> {
    vec![
        Rule::relation(
            "FMT-101",
            RuleCategory::Format,
            Severity::Error,
            B_05_01,
            RuleTarget::Field("c0010"),
            "Provider identifier must match the format of its identifier type",
            |relation, _| {
                relation
                    .rows()
                    .filter_map(|row| {
                        let id = row.text("c0010").filter(|s| !s.trim().is_empty())?;
                        let id_type = row.text("c0020")?;
                        (!provider_id_matches(id_type, id)).then(|| {
                            Violation::at(
                                row.index(),
                                "c0010",
                                format!("Provider identifier {id} is not a valid {id_type} code"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "FMT-102",
            RuleCategory::Format,
            Severity::Error,
            B_05_01,
            RuleTarget::Field("c0090"),
            "Provider parent hierarchy must not contain a cycle",
            |relation, _| {
                let parents = first_by_key(relation, "c0010", "c0090");
                relation
                    .rows()
                    .filter_map(|row| {
                        let id = row.text("c0010")?;
                        on_cycle(&parents, id).then(|| {
                            Violation::at(
                                row.index(),
                                "c0090",
                                format!("Provider {id} is its own ancestor in the parent hierarchy"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "FMT-103",
            RuleCategory::Format,
            Severity::Error,
            B_05_02,
            RuleTarget::Field("c0070"),
            "Subcontracting chain must not contain a cycle",
            |relation, _| {
                let recipients = first_by_key(relation, "c0030", "c0070");
                relation
                    .rows()
                    .filter_map(|row| {
                        let id = row.text("c0030")?;
                        on_cycle(&recipients, id).then(|| {
                            Violation::at(
                                row.index(),
                                "c0070",
                                format!("Subcontractor {id} receives services from itself through its chain"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "FMT-104",
            RuleCategory::Format,
            Severity::Error,
            B_02_02,
            RuleTarget::Field("c0220"),
            "Data categories must be non-empty and free of ';'",
            |relation, _| {
                relation
                    .rows()
                    .filter_map(|row| {
                        let items = row.get("c0220").as_list()?;
                        let bad = items.iter().find(|item| !is_list_item(item))?;
                        Some(Violation::at(
                            row.index(),
                            "c0220",
                            format!("Data category '{bad}' cannot be written as a list item"),
                        ))
                    })
                    .collect()
            },
        ),
    ]
}

fn conditional_rules() -> Vec<Rule> {
    vec![
        Rule::relation(
            "REQ-101",
            RuleCategory::Required,
            Severity::Error,
            B_06_01,
            RuleTarget::Field("c0060"),
            "A critical or important function must carry its criticality assessment",
            |relation, _| {
                relation
                    .rows()
                    .filter(|row| row.boolean("c0050") == Some(true) && row.get("c0060").is_empty())
                    .map(|row| {
                        Violation::at(
                            row.index(),
                            "c0060",
                            format!(
                                "Function {} is flagged critical but has no criticality assessment",
                                row.text("c0010").unwrap_or("?")
                            ),
                        )
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "REQ-102",
            RuleCategory::Required,
            Severity::Error,
            B_02_02,
            RuleTarget::Field("c0220"),
            "Data categories are required when personal data is processed",
            |relation, _| {
                relation
                    .rows()
                    .filter(|row| row.boolean("c0210") == Some(true) && row.get("c0220").is_empty())
                    .map(|row| {
                        Violation::at(
                            row.index(),
                            "c0220",
                            format!(
                                "Service {} processes personal data but lists no data categories",
                                row.text("c0020").unwrap_or("?")
                            ),
                        )
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "REQ-103",
            RuleCategory::Required,
            Severity::Error,
            B_02_01,
            RuleTarget::Field("c0030"),
            "A subsequent arrangement must name its overarching arrangement",
            |relation, _| {
                relation
                    .rows()
                    .filter(|row| {
                        row.text("c0020") == Some("subsequent") && row.get("c0030").is_empty()
                    })
                    .map(|row| {
                        Violation::at(
                            row.index(),
                            "c0030",
                            format!(
                                "Arrangement {} is subsequent but has no overarching reference",
                                row.text("c0010").unwrap_or("?")
                            ),
                        )
                    })
                    .collect()
            },
        ),
    ]
}

fn business_rules() -> Vec<Rule> {
    vec![
        Rule::relation(
            "BUS-001",
            RuleCategory::Business,
            Severity::Error,
            B_02_01,
            RuleTarget::Row,
            "Expiry date must be after the effective date",
            |relation, _| {
                relation
                    .rows()
                    .filter_map(|row| {
                        let start = row.date("c0060")?;
                        let end = row.date("c0070")?;
                        let message = if end < start {
                            format!("Expiry date {end} is before effective date {start}")
                        } else if end == start {
                            format!("Expiry date {end} equals effective date {start}")
                        } else {
                            return None;
                        };
                        Some(Violation::at(row.index(), "c0070", message))
                    })
                    .collect()
            },
        ),
        duplicates("BUS-002", B_02_01, "c0010", "Contractual arrangement reference"),
        duplicates("BUS-003", B_05_01, "c0010", "Provider identifier"),
        Rule::relation(
            "BUS-004",
            RuleCategory::Business,
            Severity::Error,
            B_02_02,
            RuleTarget::Field("c0180"),
            "Availability target must be a percentage between 0 and 100",
            |relation, _| {
                relation
                    .rows()
                    .filter_map(|row| {
                        let target = row.decimal("c0180")?;
                        (target < Decimal::ZERO || target > Decimal::ONE_HUNDRED).then(|| {
                            Violation::at(
                                row.index(),
                                "c0180",
                                format!("Availability target {target} is outside 0-100"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        non_negative("BUS-005", B_02_02, "c0190", "Recovery time objective"),
        non_negative("BUS-006", B_02_02, "c0200", "Recovery point objective"),
        non_negative("BUS-007", B_06_01, "c0090", "Recovery time objective"),
        non_negative("BUS-008", B_06_01, "c0100", "Recovery point objective"),
        Rule::relation(
            "BUS-009",
            RuleCategory::Business,
            Severity::Warning,
            B_02_01,
            RuleTarget::Field("c0070"),
            "Arrangement expires within the advisory window",
            |relation, ctx| {
                let horizon = ctx.expiry_horizon();
                relation
                    .rows()
                    .filter_map(|row| {
                        let end = row.date("c0070")?;
                        (end >= ctx.reporting_date && end <= horizon).then(|| {
                            Violation::at(
                                row.index(),
                                "c0070",
                                format!(
                                    "Arrangement {} expires on {end}, within {} days of the reporting date",
                                    row.text("c0010").unwrap_or("?"),
                                    ctx.expiry_warning_days
                                ),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "BUS-010",
            RuleCategory::Business,
            Severity::Warning,
            B_02_01,
            RuleTarget::Field("c0070"),
            "Arrangement already expired at the reporting date",
            |relation, ctx| {
                relation
                    .rows()
                    .filter_map(|row| {
                        let end = row.date("c0070")?;
                        (end < ctx.reporting_date).then(|| {
                            Violation::at(
                                row.index(),
                                "c0070",
                                format!(
                                    "Arrangement {} expired on {end}, before the reporting date {}",
                                    row.text("c0010").unwrap_or("?"),
                                    ctx.reporting_date
                                ),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "BUS-011",
            RuleCategory::Business,
            Severity::Error,
            B_05_02,
            RuleTarget::Field("c0060"),
            "Supply chain rank starts at 1",
            |relation, _| {
                relation
                    .rows()
                    .filter_map(|row| {
                        let rank = row.integer("c0060")?;
                        (rank < 1).then(|| {
                            Violation::at(row.index(), "c0060", format!("Rank {rank} is below 1"))
                        })
                    })
                    .collect()
            },
        ),
        Rule::relation(
            "BUS-012",
            RuleCategory::Business,
            Severity::Error,
            B_05_02,
            RuleTarget::Field("c0060"),
            "A subcontractor ranks one below the subcontractor it serves",
            |relation, _| {
                let ranks: HashMap<&str, i64> = relation
                    .rows()
                    .filter_map(|row| Some((row.text("c0030")?, row.integer("c0060")?)))
                    .collect();
                relation
                    .rows()
                    .filter_map(|row| {
                        let rank = row.integer("c0060")?;
                        let recipient = row.text("c0070")?;
                        let recipient_rank = *ranks.get(recipient)?;
                        (rank != recipient_rank + 1).then(|| {
                            Violation::at(
                                row.index(),
                                "c0060",
                                format!(
                                    "Rank {rank} does not follow rank {recipient_rank} of recipient {recipient}"
                                ),
                            )
                        })
                    })
                    .collect()
            },
        ),
        non_negative("BUS-013", B_02_01, "c0110", "Notice period for the entity"),
        non_negative("BUS-014", B_02_01, "c0120", "Notice period for the provider"),
        duplicates("BUS-015", B_06_01, "c0010", "Function identifier"),
    ]
}

fn referential_rules() -> Vec<Rule> {
    vec![
        Rule::references(
            "REF-001",
            Severity::Error,
            B_02_02,
            "c0010",
            B_02_01,
            "c0010",
            "Every service references a reported contractual arrangement",
        ),
        Rule::references(
            "REF-002",
            Severity::Error,
            B_02_01,
            "c0080",
            B_05_01,
            "c0010",
            "Every arrangement references a reported provider",
        ),
        Rule::references(
            "REF-003",
            Severity::Error,
            B_02_02,
            "c0050",
            B_06_01,
            "c0010",
            "Every supported function is reported in B_06.01",
        ),
        Rule::references(
            "REF-004",
            Severity::Error,
            B_02_01,
            "c0090",
            B_01_02,
            "c0010",
            "The signing entity is within the scope of the register",
        ),
        Rule::references(
            "REF-005",
            Severity::Error,
            B_06_01,
            "c0040",
            B_01_02,
            "c0010",
            "The entity performing a function is within the scope of the register",
        ),
        Rule::references(
            "REF-006",
            Severity::Error,
            B_02_03,
            "c0020",
            B_02_01,
            "c0010",
            "The overarching arrangement is reported",
        ),
        Rule::references(
            "REF-007",
            Severity::Error,
            B_01_03,
            "c0020",
            B_01_02,
            "c0010",
            "The head office of a branch is within the scope of the register",
        ),
        Rule::references(
            "REF-008",
            Severity::Error,
            B_05_02,
            "c0010",
            B_02_01,
            "c0010",
            "A supply chain references a reported contractual arrangement",
        ),
        Rule::cross(
            "REF-009",
            RuleCategory::Referential,
            Severity::Error,
            B_05_02,
            &[B_05_01],
            "The recipient of a subcontracted service is a provider or a subcontractor",
            |relations, _| {
                let (Some(chains), Some(providers)) =
                    (relations.get(B_05_02), relations.get(B_05_01))
                else {
                    return Vec::new();
                };
                let known: BTreeSet<&str> = providers
                    .key_set("c0010")
                    .union(&chains.key_set("c0030"))
                    .copied()
                    .collect();
                chains
                    .rows()
                    .filter_map(|row| {
                        let recipient = row.text("c0070").filter(|s| !s.trim().is_empty())?;
                        (!known.contains(recipient)).then(|| {
                            Violation::at(
                                row.index(),
                                "c0070",
                                format!("Recipient {recipient} is neither a reported provider nor a subcontractor"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::references(
            "REF-010",
            Severity::Warning,
            B_05_01,
            "c0090",
            B_05_01,
            "c0010",
            "The parent of a provider is itself reported",
        ),
        Rule::references(
            "REF-011",
            Severity::Error,
            B_04_01,
            "c0040",
            B_01_03,
            "c0010",
            "A branch making use of a service is reported in B_01.03",
        ),
        Rule::cross(
            "REF-012",
            RuleCategory::Referential,
            Severity::Error,
            B_05_02,
            &[B_05_01],
            "A rank 1 subcontractor serves a reported provider directly",
            |relations, _| {
                let (Some(chains), Some(providers)) =
                    (relations.get(B_05_02), relations.get(B_05_01))
                else {
                    return Vec::new();
                };
                let provider_ids = providers.key_set("c0010");
                chains
                    .rows()
                    .filter(|row| row.integer("c0060") == Some(1))
                    .filter_map(|row| {
                        let recipient = row.text("c0070")?;
                        (!provider_ids.contains(recipient)).then(|| {
                            Violation::at(
                                row.index(),
                                "c0070",
                                format!("Rank 1 subcontractor serves {recipient}, which is not a reported provider"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::references(
            "REF-013",
            Severity::Error,
            B_02_02,
            "c0040",
            B_05_01,
            "c0010",
            "The provider of a service is reported in B_05.01",
        ),
        Rule::references(
            "REF-014",
            Severity::Error,
            B_02_02,
            "c0030",
            B_01_02,
            "c0010",
            "The entity making use of a service is within the scope of the register",
        ),
    ]
}

fn aggregate_rules() -> Vec<Rule> {
    vec![
        Rule::cross(
            "AGG-001",
            RuleCategory::Aggregate,
            Severity::Error,
            B_06_01,
            &[B_02_02],
            "Every critical or important function is supported by at least one ICT service",
            |relations, _| {
                let (Some(functions), Some(services)) =
                    (relations.get(B_06_01), relations.get(B_02_02))
                else {
                    return Vec::new();
                };
                let supported = services.key_set("c0050");
                functions
                    .rows()
                    .filter(|row| row.boolean("c0050") == Some(true))
                    .filter_map(|row| {
                        let id = row.text("c0010")?;
                        (!supported.contains(id)).then(|| {
                            Violation::row(
                                row.index(),
                                format!("Critical function {id} is not supported by any ICT service"),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::cross(
            "AGG-002",
            RuleCategory::Aggregate,
            Severity::Error,
            B_05_01,
            &[B_02_01],
            "Provider total annual expense equals the sum over its arrangements",
            |relations, _| {
                let (Some(providers), Some(contracts)) =
                    (relations.get(B_05_01), relations.get(B_02_01))
                else {
                    return Vec::new();
                };
                let mut totals: HashMap<&str, Decimal> = HashMap::new();
                for row in contracts.rows() {
                    if let (Some(provider), Some(cost)) = (row.text("c0080"), row.decimal("c0050"))
                    {
                        *totals.entry(provider).or_default() += cost;
                    }
                }
                providers
                    .rows()
                    .filter_map(|row| {
                        let id = row.text("c0010")?;
                        let expected = totals.get(id).copied();
                        let reported = row.decimal("c0080");
                        let matches = match (reported, expected) {
                            (Some(r), Some(e)) => r == e,
                            (None, None) => true,
                            (Some(r), None) => r.is_zero(),
                            (None, Some(e)) => e.is_zero(),
                        };
                        (!matches).then(|| {
                            Violation::at(
                                row.index(),
                                "c0080",
                                format!(
                                    "Total annual expense {} of provider {id} differs from the arrangement total {}",
                                    reported.map_or_else(|| "(none)".to_string(), |d| d.to_string()),
                                    expected.unwrap_or_default()
                                ),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::cross(
            "AGG-003",
            RuleCategory::Aggregate,
            Severity::Error,
            B_05_02,
            &[],
            "Supply chain ranks of an arrangement are contiguous from 1",
            |relations, _| {
                let Some(chains) = relations.get(B_05_02) else {
                    return Vec::new();
                };
                let mut groups: BTreeMap<&str, (usize, BTreeSet<i64>)> = BTreeMap::new();
                for row in chains.rows() {
                    if let (Some(contract), Some(rank)) = (row.text("c0010"), row.integer("c0060"))
                    {
                        groups
                            .entry(contract)
                            .or_insert_with(|| (row.index(), BTreeSet::new()))
                            .1
                            .insert(rank);
                    }
                }
                groups
                    .into_iter()
                    .filter_map(|(contract, (first_row, ranks))| {
                        let max = ranks.iter().copied().max()?;
                        let missing: Vec<String> = (1..=max)
                            .filter(|r| !ranks.contains(r))
                            .map(|r| r.to_string())
                            .collect();
                        (!missing.is_empty()).then(|| {
                            Violation::at(
                                first_row,
                                "c0060",
                                format!(
                                    "Supply chain of arrangement {contract} skips rank(s) {}",
                                    missing.join(", ")
                                ),
                            )
                        })
                    })
                    .collect()
            },
        ),
        Rule::cross(
            "AGG-004",
            RuleCategory::Aggregate,
            Severity::Warning,
            B_02_02,
            &[B_06_01],
            "A critical ICT service supports at least one critical or important function",
            |relations, _| {
                let (Some(services), Some(functions)) =
                    (relations.get(B_02_02), relations.get(B_06_01))
                else {
                    return Vec::new();
                };
                let critical_functions: HashSet<&str> = functions
                    .rows()
                    .filter(|row| row.boolean("c0050") == Some(true))
                    .filter_map(|row| row.text("c0010"))
                    .collect();

                let mut first_row: BTreeMap<&str, usize> = BTreeMap::new();
                let mut supports_critical: HashSet<&str> = HashSet::new();
                for row in services.rows() {
                    if row.text("c0170") != Some("critical") {
                        continue;
                    }
                    let Some(service) = row.text("c0020") else {
                        continue;
                    };
                    first_row.entry(service).or_insert(row.index());
                    if row
                        .text("c0050")
                        .is_some_and(|f| critical_functions.contains(f))
                    {
                        supports_critical.insert(service);
                    }
                }
                first_row
                    .into_iter()
                    .filter(|(service, _)| !supports_critical.contains(service))
                    .map(|(service, index)| {
                        Violation::at(
                            index,
                            "c0170",
                            format!("Critical service {service} supports no critical or important function"),
                        )
                    })
                    .collect()
            },
        ),
        Rule::cross(
            "AGG-005",
            RuleCategory::Aggregate,
            Severity::Warning,
            B_05_01,
            &[B_02_01],
            "Every reported provider has at least one arrangement",
            |relations, _| {
                let (Some(providers), Some(contracts)) =
                    (relations.get(B_05_01), relations.get(B_02_01))
                else {
                    return Vec::new();
                };
                let contracted = contracts.key_set("c0080");
                providers
                    .rows()
                    .filter_map(|row| {
                        let id = row.text("c0010")?;
                        (!contracted.contains(id)).then(|| {
                            Violation::row(row.index(), format!("Provider {id} has no contractual arrangement"))
                        })
                    })
                    .collect()
            },
        ),
    ]
}

fn duplicates(id: &str, template: TemplateCode, field: &'static str, what: &str) -> Rule {
    let what = what.to_string();
    Rule::relation(
        id,
        RuleCategory::Business,
        Severity::Error,
        template,
        RuleTarget::Field(field),
        &format!("{what} is unique within {template}"),
        move |relation, _| {
            let mut first_seen: HashMap<&str, usize> = HashMap::new();
            relation
                .rows()
                .filter_map(|row| {
                    let key = row.text(field).filter(|s| !s.trim().is_empty())?;
                    match first_seen.get(key) {
                        Some(first) => Some(Violation::at(
                            row.index(),
                            field,
                            format!("{what} {key} duplicates row {first}"),
                        )),
                        None => {
                            first_seen.insert(key, row.index());
                            None
                        }
                    }
                })
                .collect()
        },
    )
}

fn non_negative(id: &str, template: TemplateCode, field: &'static str, what: &str) -> Rule {
    let what = what.to_string();
    Rule::relation(
        id,
        RuleCategory::Business,
        Severity::Error,
        template,
        RuleTarget::Field(field),
        &format!("{what} must not be negative"),
        move |relation, _| {
            relation
                .rows()
                .filter_map(|row| {
                    let value = row.integer(field)?;
                    (value < 0).then(|| {
                        Violation::at(row.index(), field, format!("{what} {value} is negative"))
                    })
                })
                .collect()
        },
    )
}

/// Maps the first occurrence of each key to the value of another column
fn first_by_key<'a>(relation: &'a Relation, key: &str, value: &str) -> HashMap<&'a str, &'a str> {
    let mut map = HashMap::new();
    for row in relation.rows() {
        if let (Some(k), Some(v)) = (row.text(key), row.text(value)) {
            map.entry(k).or_insert(v);
        }
    }
    map
}

/// Whether following `links` from `start` leads back to `start`
fn on_cycle(links: &HashMap<&str, &str>, start: &str) -> bool {
    let mut visited = HashSet::new();
    let mut current = start;
    while let Some(&next) = links.get(current) {
        if next == start {
            return true;
        }
        if !visited.insert(next) {
            return false;
        }
        current = next;
    }
    false
}

/// Rules keyed by id
pub fn rule_index(rules: &[Rule]) -> BTreeMap<&str, &Rule> {
    rules.iter().map(|rule| (rule.id.as_str(), rule)).collect()
}
