//! Compilation inputs

use crate::core::registry::TemplateRegistry;
use crate::core::validation::ValidationLevel;
use crate::domain::{OrganizationId, RegistryError, TemplateCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifies one compilation: whose register, for which reporting date
///
/// Threaded through every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileContext {
    pub organization_id: OrganizationId,
    pub reporting_date: NaiveDate,
}

impl CompileContext {
    pub fn new(organization_id: OrganizationId, reporting_date: NaiveDate) -> Self {
        Self {
            organization_id,
            reporting_date,
        }
    }
}

/// Templates a run exports
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateSelection {
    #[default]
    All,
    /// The listed templates; their prerequisites are built but not exported
    Subset(Vec<TemplateCode>),
}

impl TemplateSelection {
    /// Parses template codes; an empty list selects every template
    pub fn parse(codes: &[String]) -> Result<Self, String> {
        if codes.is_empty() {
            return Ok(TemplateSelection::All);
        }
        codes
            .iter()
            .map(|code| TemplateCode::from_str(code))
            .collect::<Result<Vec<_>, _>>()
            .map(TemplateSelection::Subset)
    }

    /// Requested templates in code order
    pub fn resolve(&self, registry: &TemplateRegistry) -> Result<Vec<TemplateCode>, RegistryError> {
        match self {
            TemplateSelection::All => Ok(registry.codes().collect()),
            TemplateSelection::Subset(codes) => {
                let mut codes = codes.clone();
                codes.sort();
                codes.dedup();
                if let Some(unknown) = codes.iter().find(|c| !registry.contains(**c)) {
                    return Err(RegistryError::UnknownTemplate(unknown.to_string()));
                }
                Ok(codes)
            }
        }
    }
}

/// What a blocked run writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnBlocked {
    /// No package
    #[default]
    Skip,
    /// A package marked as draft, next to the findings
    Draft,
}

impl FromStr for OnBlocked {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(OnBlocked::Skip),
            "draft" => Ok(OnBlocked::Draft),
            other => Err(format!("Invalid on_blocked '{other}', expected skip or draft")),
        }
    }
}

/// Run options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub validation_level: ValidationLevel,
    pub templates: TemplateSelection,
    pub on_blocked: OnBlocked,
    /// Templates built at the same time
    pub build_concurrency: usize,
    pub expiry_warning_days: i64,
    pub include_parameters: bool,
    pub base_currency: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            validation_level: ValidationLevel::Lenient,
            templates: TemplateSelection::All,
            on_blocked: OnBlocked::Skip,
            build_concurrency: 4,
            expiry_warning_days: 90,
            include_parameters: true,
            base_currency: "EUR".to_string(),
        }
    }
}
