//! In-memory record store, used by tests and embedding callers

use crate::adapters::store::RecordStore;
use crate::core::sources::SourceSnapshot;
use crate::domain::{
    Contract, CriticalFunction, DataLocation, OrganizationId, Provider, ReportingEntity, Result,
    Service, SourceError, Subcontractor,
};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    organizations: HashMap<OrganizationId, SourceSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a single organization
    pub fn with_organization(organization_id: OrganizationId, records: SourceSnapshot) -> Self {
        let mut store = Self::new();
        store.insert(organization_id, records);
        store
    }

    /// Inserts or replaces the records of an organization
    pub fn insert(&mut self, organization_id: OrganizationId, records: SourceSnapshot) {
        self.organizations.insert(organization_id, records);
    }

    fn records(&self, organization_id: &OrganizationId) -> Result<&SourceSnapshot> {
        self.organizations
            .get(organization_id)
            .ok_or_else(|| SourceError::OrganizationNotFound(organization_id.to_string()).into())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn reporting_entity(&self, organization_id: &OrganizationId) -> Result<ReportingEntity> {
        Ok(self.records(organization_id)?.entity.clone())
    }

    async fn list_providers(&self, organization_id: &OrganizationId) -> Result<Vec<Provider>> {
        Ok(self.records(organization_id)?.providers.clone())
    }

    async fn list_contracts(&self, organization_id: &OrganizationId) -> Result<Vec<Contract>> {
        Ok(self.records(organization_id)?.contracts.clone())
    }

    async fn list_services(&self, organization_id: &OrganizationId) -> Result<Vec<Service>> {
        Ok(self.records(organization_id)?.services.clone())
    }

    async fn list_data_locations(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<DataLocation>> {
        Ok(self.records(organization_id)?.data_locations.clone())
    }

    async fn list_critical_functions(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CriticalFunction>> {
        Ok(self.records(organization_id)?.functions.clone())
    }

    async fn list_subcontractors(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Subcontractor>> {
        Ok(self.records(organization_id)?.subcontractors.clone())
    }
}
