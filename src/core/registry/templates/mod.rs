//! The fifteen standard templates of the register

mod contracts;
mod definitions;
mod entity;
mod functions;
mod providers;

use crate::core::registry::TemplateDescriptor;
use crate::core::relation::{Relation, RowRef};

/// Shape of free-form reference codes (contracts, branches, functions)
pub const REFERENCE_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9 ._/-]{0,99}$";

/// Descriptors of the standard register, in template code order
pub fn standard_descriptors() -> Vec<TemplateDescriptor> {
    vec![
        entity::ENTITY_MAINTAINING_REGISTER,
        entity::ENTITIES_IN_SCOPE,
        entity::BRANCHES,
        contracts::ARRANGEMENTS_GENERAL,
        contracts::ARRANGEMENTS_SPECIFIC,
        contracts::LINKED_ARRANGEMENTS,
        contracts::SIGNING_ENTITIES,
        contracts::SIGNING_PROVIDERS,
        contracts::INTRA_GROUP_PROVIDERS,
        contracts::USING_ENTITIES,
        providers::PROVIDERS,
        providers::SUPPLY_CHAINS,
        functions::FUNCTIONS,
        functions::SERVICE_ASSESSMENTS,
        definitions::CODE_DEFINITIONS,
    ]
}

/// First row of `relation` whose text `field` equals `key`
pub(crate) fn find_row<'a>(
    relation: Option<&'a Relation>,
    field: &str,
    key: &str,
) -> Option<RowRef<'a>> {
    relation?.rows().find(|row| row.text(field) == Some(key))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Well-formed, fully cross-referenced sources shared by template tests

    use crate::core::registry::{BuildContext, TemplateRegistry};
    use crate::core::relation::{Relation, RelationSet};
    use crate::core::sources::SourceSnapshot;
    use crate::domain::{
        Assessment, Branch, Contract, CriticalFunction, DataLocation, GroupEntity, Provider,
        ReportingEntity, ResponsiblePerson, Service, Subcontractor, TemplateCode,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    pub const ENTITY_LEI: &str = "529900T8BM49AURSDO55";
    pub const SUBSIDIARY_LEI: &str = "529900SUBSIDIARY0042";
    pub const CLOUD_LEI: &str = "549300MLUDYVRQOOXS22";

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn reporting_date() -> NaiveDate {
        date(2025, 12, 31)
    }

    pub fn snapshot() -> SourceSnapshot {
        let entity = ReportingEntity {
            lei: ENTITY_LEI.to_string(),
            name: "Acme Bank AG".to_string(),
            country: "DE".to_string(),
            entity_type: "credit_institution".to_string(),
            competent_authority: "BaFin".to_string(),
            currency: "EUR".to_string(),
            total_assets: Some(Decimal::new(125_000_000_00, 2)),
            branches: vec![Branch {
                code: "BR-PAR".to_string(),
                name: "Acme Paris".to_string(),
                country: "FR".to_string(),
                head_office_lei: None,
            }],
            responsible_persons: vec![ResponsiblePerson {
                name: "Jane Roe".to_string(),
                role: Some("CISO".to_string()),
                email: Some("jane.roe@acme.example".to_string()),
            }],
            group_entities: vec![GroupEntity {
                lei: SUBSIDIARY_LEI.to_string(),
                name: "Acme IT Services GmbH".to_string(),
                country: "DE".to_string(),
                entity_type: "other".to_string(),
                currency: "EUR".to_string(),
                parent_lei: Some(ENTITY_LEI.to_string()),
                total_assets: None,
            }],
        };

        let mut snapshot = SourceSnapshot::new(entity);
        snapshot.providers = vec![
            Provider {
                id: CLOUD_LEI.to_string(),
                id_type: "lei".to_string(),
                name: "Cloudy Ltd".to_string(),
                name_latin: None,
                person_type: "legal".to_string(),
                country: "IE".to_string(),
                currency: "EUR".to_string(),
                classification: "cloud_service_provider".to_string(),
                intra_group: false,
                parent_id: None,
            },
            Provider {
                id: SUBSIDIARY_LEI.to_string(),
                id_type: "lei".to_string(),
                name: "Acme IT Services GmbH".to_string(),
                name_latin: None,
                person_type: "legal".to_string(),
                country: "DE".to_string(),
                currency: "EUR".to_string(),
                classification: "managed_service_provider".to_string(),
                intra_group: true,
                parent_id: None,
            },
        ];
        snapshot.contracts = vec![
            Contract {
                id: "1".to_string(),
                reference: "C-001".to_string(),
                entity_lei: ENTITY_LEI.to_string(),
                provider_id: CLOUD_LEI.to_string(),
                contract_type: "overarching".to_string(),
                overarching_reference: None,
                effective_date: date(2024, 1, 1),
                expiry_date: Some(date(2028, 12, 31)),
                governing_law_country: "IE".to_string(),
                notice_period_entity_days: Some(90),
                notice_period_provider_days: Some(180),
                termination_reason: None,
                currency: "EUR".to_string(),
                annual_cost: Some(Decimal::new(120_000_00, 2)),
                using_branch: None,
            },
            Contract {
                id: "2".to_string(),
                reference: "C-002".to_string(),
                entity_lei: ENTITY_LEI.to_string(),
                provider_id: SUBSIDIARY_LEI.to_string(),
                contract_type: "subsequent".to_string(),
                overarching_reference: Some("C-001".to_string()),
                effective_date: date(2024, 6, 1),
                expiry_date: None,
                governing_law_country: "DE".to_string(),
                notice_period_entity_days: Some(30),
                notice_period_provider_days: Some(30),
                termination_reason: None,
                currency: "EUR".to_string(),
                annual_cost: Some(Decimal::new(45_500_50, 2)),
                using_branch: Some("BR-PAR".to_string()),
            },
        ];
        snapshot.services = vec![
            Service {
                id: "S-1".to_string(),
                contract_reference: "C-001".to_string(),
                classification: "S17".to_string(),
                criticality: "critical".to_string(),
                country_of_provision: "IE".to_string(),
                availability_target: Some(Decimal::new(9995, 2)),
                recovery_time_minutes: Some(60),
                recovery_point_minutes: Some(15),
                personal_data: true,
                data_categories: vec!["customer".to_string(), "payment".to_string()],
                substitutability: Some("highly_complex".to_string()),
                exit_plan: true,
                reintegration_possible: Some(false),
                last_audit_date: Some(date(2025, 3, 1)),
                alternative_providers: Some(2),
            },
            Service {
                id: "S-2".to_string(),
                contract_reference: "C-002".to_string(),
                classification: "S14".to_string(),
                criticality: "important".to_string(),
                country_of_provision: "DE".to_string(),
                availability_target: Some(Decimal::new(99, 0)),
                recovery_time_minutes: Some(240),
                recovery_point_minutes: Some(60),
                personal_data: false,
                data_categories: vec![],
                substitutability: Some("easy".to_string()),
                exit_plan: true,
                reintegration_possible: Some(true),
                last_audit_date: Some(date(2025, 2, 1)),
                alternative_providers: Some(5),
            },
        ];
        snapshot.data_locations = vec![
            DataLocation {
                id: "L-1".to_string(),
                service_id: "S-1".to_string(),
                country: "IE".to_string(),
                location_type: "storage".to_string(),
                sensitivity: "high".to_string(),
            },
            DataLocation {
                id: "L-2".to_string(),
                service_id: "S-1".to_string(),
                country: "NL".to_string(),
                location_type: "backup".to_string(),
                sensitivity: "medium".to_string(),
            },
        ];
        snapshot.functions = vec![
            CriticalFunction {
                id: "F-1".to_string(),
                entity_lei: ENTITY_LEI.to_string(),
                name: "Payments processing".to_string(),
                licensed_activity: Some("payment_services".to_string()),
                is_critical: true,
                assessment: Some(Assessment::Dora {
                    reasons: "Disruption halts customer payments".to_string(),
                    impact: Some("high".to_string()),
                    assessed_on: Some(date(2025, 1, 15)),
                }),
                service_ids: vec!["S-1".to_string()],
                recovery_time_minutes: Some(120),
                recovery_point_minutes: Some(30),
            },
            CriticalFunction {
                id: "F-2".to_string(),
                entity_lei: ENTITY_LEI.to_string(),
                name: "Internal reporting".to_string(),
                licensed_activity: None,
                is_critical: false,
                assessment: None,
                service_ids: vec!["S-2".to_string()],
                recovery_time_minutes: None,
                recovery_point_minutes: None,
            },
        ];
        snapshot.subcontractors = vec![
            Subcontractor {
                id: "SUB-1".to_string(),
                name: "Racks & Power SA".to_string(),
                country: "FR".to_string(),
                provider_id: Some(CLOUD_LEI.to_string()),
                parent_id: None,
                tier: 1,
                service_id: Some("S-1".to_string()),
            },
            Subcontractor {
                id: "SUB-2".to_string(),
                name: "Cooling Ops BV".to_string(),
                country: "NL".to_string(),
                provider_id: None,
                parent_id: Some("SUB-1".to_string()),
                tier: 2,
                service_id: None,
            },
        ];
        snapshot.normalized()
    }

    /// Builds every standard template in dependency order, sequentially
    pub fn build_all(sources: &SourceSnapshot) -> RelationSet {
        let registry = TemplateRegistry::standard().unwrap();
        let order = [
            TemplateCode::B_01_01,
            TemplateCode::B_01_02,
            TemplateCode::B_01_03,
            TemplateCode::B_05_01,
            TemplateCode::B_06_01,
            TemplateCode::B_02_01,
            TemplateCode::B_02_02,
            TemplateCode::B_02_03,
            TemplateCode::B_03_01,
            TemplateCode::B_03_02,
            TemplateCode::B_03_03,
            TemplateCode::B_04_01,
            TemplateCode::B_05_02,
            TemplateCode::B_07_01,
            TemplateCode::B_99_01,
        ];
        let mut relations = RelationSet::new();
        for code in order {
            let descriptor = registry.descriptor(code).unwrap();
            let ctx = BuildContext::new(reporting_date(), sources, &relations, &registry);
            let rows = (descriptor.build)(&ctx);
            let relation = Relation::new(code, descriptor.columns(), rows).unwrap();
            relations.insert(relation);
        }
        relations
    }
}
