//! Record store abstraction
//!
//! Read-only query interface over the normalized source entities. Every query
//! is scoped to one organization. Soft-deleted records never leave a store
//! implementation; the engine has no notion of deletion.

pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::SnapshotStore;

use crate::domain::{
    Contract, CriticalFunction, DataLocation, OrganizationId, Provider, ReportingEntity, Result,
    Service, Subcontractor,
};
use async_trait::async_trait;

/// Source of register records
///
/// Implementations must be safe for concurrent reads: the compiler issues the
/// list queries of one run in parallel.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Test the connection to the store
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    /// The reporting entity of the organization
    ///
    /// # Errors
    ///
    /// Returns `SourceError::OrganizationNotFound` when the organization has
    /// no reporting entity.
    async fn reporting_entity(&self, organization_id: &OrganizationId) -> Result<ReportingEntity>;

    async fn list_providers(&self, organization_id: &OrganizationId) -> Result<Vec<Provider>>;

    async fn list_contracts(&self, organization_id: &OrganizationId) -> Result<Vec<Contract>>;

    async fn list_services(&self, organization_id: &OrganizationId) -> Result<Vec<Service>>;

    async fn list_data_locations(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<DataLocation>>;

    async fn list_critical_functions(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CriticalFunction>>;

    async fn list_subcontractors(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Subcontractor>>;
}
