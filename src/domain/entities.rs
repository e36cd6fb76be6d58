//! Source entities read from the record store
//!
//! These are read-only inputs. Vocabulary-backed fields (classifications,
//! criticality levels, country codes) are kept as the raw stored strings so
//! that an out-of-vocabulary value reaches the validation engine as a finding
//! instead of failing to load.

use crate::domain::assessment::Assessment;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The financial entity maintaining the register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingEntity {
    /// Legal Entity Identifier (20 alphanumeric characters)
    pub lei: String,
    pub name: String,
    /// ISO 3166-1 alpha-2 jurisdiction
    pub country: String,
    pub entity_type: String,
    pub competent_authority: String,
    /// ISO 4217 reporting currency
    pub currency: String,
    #[serde(default)]
    pub total_assets: Option<Decimal>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub responsible_persons: Vec<ResponsiblePerson>,
    /// Other group entities within the scope of the register
    #[serde(default)]
    pub group_entities: Vec<GroupEntity>,
}

/// A branch of an entity within scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub code: String,
    pub name: String,
    pub country: String,
    /// LEI of the head office; defaults to the reporting entity
    #[serde(default)]
    pub head_office_lei: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsiblePerson {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Another entity of the group covered by the register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntity {
    pub lei: String,
    pub name: String,
    pub country: String,
    pub entity_type: String,
    pub currency: String,
    #[serde(default)]
    pub parent_lei: Option<String>,
    #[serde(default)]
    pub total_assets: Option<Decimal>,
}

/// ICT third-party service provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Regulatory identifier of the provider, interpreted per `id_type`
    pub id: String,
    /// lei, euid, vat or other
    pub id_type: String,
    pub name: String,
    #[serde(default)]
    pub name_latin: Option<String>,
    /// legal or natural
    pub person_type: String,
    pub country: String,
    pub currency: String,
    /// Provider classification
    pub classification: String,
    #[serde(default)]
    pub intra_group: bool,
    /// Parent provider; providers form a tree
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Contractual arrangement between an entity and a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    /// Reference code reported in the register
    pub reference: String,
    pub entity_lei: String,
    pub provider_id: String,
    /// standalone, overarching or subsequent
    pub contract_type: String,
    #[serde(default)]
    pub overarching_reference: Option<String>,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    pub governing_law_country: String,
    #[serde(default)]
    pub notice_period_entity_days: Option<i64>,
    #[serde(default)]
    pub notice_period_provider_days: Option<i64>,
    #[serde(default)]
    pub termination_reason: Option<String>,
    pub currency: String,
    #[serde(default)]
    pub annual_cost: Option<Decimal>,
    /// Branch code when the arrangement is used through a branch
    #[serde(default)]
    pub using_branch: Option<String>,
}

/// ICT service delivered under a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    /// Reference code of the contract the service is delivered under
    pub contract_reference: String,
    /// ICT service type (S01-S19)
    pub classification: String,
    /// critical, important or non_critical
    pub criticality: String,
    pub country_of_provision: String,
    #[serde(default)]
    pub availability_target: Option<Decimal>,
    #[serde(default)]
    pub recovery_time_minutes: Option<i64>,
    #[serde(default)]
    pub recovery_point_minutes: Option<i64>,
    #[serde(default)]
    pub personal_data: bool,
    #[serde(default)]
    pub data_categories: Vec<String>,
    #[serde(default)]
    pub substitutability: Option<String>,
    #[serde(default)]
    pub exit_plan: bool,
    #[serde(default)]
    pub reintegration_possible: Option<bool>,
    #[serde(default)]
    pub last_audit_date: Option<NaiveDate>,
    #[serde(default)]
    pub alternative_providers: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLocation {
    pub id: String,
    pub service_id: String,
    pub country: String,
    /// processing, storage, backup or disaster_recovery
    pub location_type: String,
    /// low, medium or high
    pub sensitivity: String,
}

/// Business function of an entity within scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalFunction {
    pub id: String,
    pub entity_lei: String,
    pub name: String,
    #[serde(default)]
    pub licensed_activity: Option<String>,
    pub is_critical: bool,
    #[serde(default)]
    pub assessment: Option<Assessment>,
    /// Services supporting the function
    #[serde(default)]
    pub service_ids: Vec<String>,
    #[serde(default)]
    pub recovery_time_minutes: Option<i64>,
    #[serde(default)]
    pub recovery_point_minutes: Option<i64>,
}

/// Link in an ICT supply chain
///
/// Tier 1 subcontractors hang off a provider, deeper tiers off another
/// subcontractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcontractor {
    pub id: String,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub tier: i64,
    #[serde(default)]
    pub service_id: Option<String>,
}

/// Source kinds a template reads from the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    ReportingEntity,
    Providers,
    Contracts,
    Services,
    DataLocations,
    CriticalFunctions,
    Subcontractors,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ReportingEntity => "reporting_entity",
            SourceKind::Providers => "providers",
            SourceKind::Contracts => "contracts",
            SourceKind::Services => "services",
            SourceKind::DataLocations => "data_locations",
            SourceKind::CriticalFunctions => "critical_functions",
            SourceKind::Subcontractors => "subcontractors",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
