//! Domain models and types.
//!
//! - **Identifiers** ([`OrganizationId`], [`TemplateCode`])
//! - **Source entities** read from the record store ([`Provider`], [`Contract`], ...)
//! - **Assessment payloads** of critical functions ([`Assessment`])
//! - **Validation findings** ([`ValidationFinding`])
//! - **Error types** ([`RoiError`], [`RegistryError`], [`SourceError`]) and the
//!   [`Result`] alias
//!
//! ```rust
//! use dora_roi::domain::{OrganizationId, TemplateCode};
//!
//! let org = OrganizationId::new("acme-bank").unwrap();
//! let code: TemplateCode = "B_02.01".parse().unwrap();
//! assert_eq!(code, TemplateCode::B_02_01);
//! # let _ = org;
//! ```

pub mod assessment;
pub mod context;
pub mod entities;
pub mod errors;
pub mod finding;
pub mod ids;
pub mod result;

pub use assessment::{AuditOpinion, Assessment, Soc2ReportType};
pub use entities::{
    Branch, Contract, CriticalFunction, DataLocation, GroupEntity, Provider, ReportingEntity,
    ResponsiblePerson, Service, SourceKind, Subcontractor,
};
pub use errors::{RegistryError, RoiError, SourceError};
pub use finding::{FindingsExt, RuleCategory, Severity, ValidationFinding};
pub use ids::{OrganizationId, TemplateCode};
pub use result::Result;
