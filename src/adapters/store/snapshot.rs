//! JSON snapshot record store
//!
//! Reads an export of the normalized tables from a JSON file. Records carry
//! an optional `deleted_at` marker; marked records are dropped here.
//!
//! ```json
//! {
//!   "organizations": [
//!     {
//!       "organization_id": "acme-bank",
//!       "reporting_entity": { "lei": "529900T8BM49AURSDO55", "...": "..." },
//!       "providers": [ { "id": "549300MLUDYVRQOOXS22", "deleted_at": null, "...": "..." } ],
//!       "contracts": [],
//!       "services": []
//!     }
//!   ]
//! }
//! ```

use crate::adapters::store::RecordStore;
use crate::domain::{
    Contract, CriticalFunction, DataLocation, OrganizationId, Provider, ReportingEntity, Result,
    RoiError, Service, SourceError, Subcontractor,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// A stored record with its soft-deletion marker
#[derive(Debug, Clone, Deserialize)]
struct Stored<T> {
    #[serde(flatten)]
    record: T,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    organizations: Vec<OrganizationRecords>,
}

#[derive(Debug, Clone, Deserialize)]
struct OrganizationRecords {
    organization_id: OrganizationId,
    #[serde(default)]
    reporting_entity: Option<Stored<ReportingEntity>>,
    #[serde(default)]
    providers: Vec<Stored<Provider>>,
    #[serde(default)]
    contracts: Vec<Stored<Contract>>,
    #[serde(default)]
    services: Vec<Stored<Service>>,
    #[serde(default)]
    data_locations: Vec<Stored<DataLocation>>,
    #[serde(default)]
    critical_functions: Vec<Stored<CriticalFunction>>,
    #[serde(default)]
    subcontractors: Vec<Stored<Subcontractor>>,
}

fn live<T: Clone>(records: &[Stored<T>]) -> Vec<T> {
    records
        .iter()
        .filter(|r| r.deleted_at.is_none())
        .map(|r| r.record.clone())
        .collect()
}

/// Record store backed by a JSON snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    organizations: HashMap<OrganizationId, OrganizationRecords>,
}

impl SnapshotStore {
    /// Reads and parses a snapshot file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            SourceError::ConnectionFailed(format!(
                "Failed to read snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "Reading snapshot");
        Self::from_json(&contents)
    }

    /// Parses snapshot JSON
    pub fn from_json(contents: &str) -> Result<Self> {
        let file: SnapshotFile =
            serde_json::from_str(contents).map_err(|e| SourceError::InvalidRecord {
                kind: "snapshot".to_string(),
                message: e.to_string(),
            })?;

        let mut organizations = HashMap::new();
        for records in file.organizations {
            let id = records.organization_id.clone();
            if organizations.insert(id.clone(), records).is_some() {
                return Err(SourceError::InvalidRecord {
                    kind: "snapshot".to_string(),
                    message: format!("organization {id} appears more than once"),
                }
                .into());
            }
        }

        tracing::info!(
            organizations = organizations.len(),
            "Snapshot record store opened"
        );
        Ok(Self { organizations })
    }

    fn records(&self, organization_id: &OrganizationId) -> Result<&OrganizationRecords> {
        self.organizations.get(organization_id).ok_or_else(|| {
            RoiError::from(SourceError::OrganizationNotFound(
                organization_id.to_string(),
            ))
        })
    }
}

#[async_trait]
impl RecordStore for SnapshotStore {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn reporting_entity(&self, organization_id: &OrganizationId) -> Result<ReportingEntity> {
        self.records(organization_id)?
            .reporting_entity
            .as_ref()
            .filter(|e| e.deleted_at.is_none())
            .map(|e| e.record.clone())
            .ok_or_else(|| {
                SourceError::OrganizationNotFound(format!(
                    "{organization_id} has no reporting entity"
                ))
                .into()
            })
    }

    async fn list_providers(&self, organization_id: &OrganizationId) -> Result<Vec<Provider>> {
        Ok(live(&self.records(organization_id)?.providers))
    }

    async fn list_contracts(&self, organization_id: &OrganizationId) -> Result<Vec<Contract>> {
        Ok(live(&self.records(organization_id)?.contracts))
    }

    async fn list_services(&self, organization_id: &OrganizationId) -> Result<Vec<Service>> {
        Ok(live(&self.records(organization_id)?.services))
    }

    async fn list_data_locations(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<DataLocation>> {
        Ok(live(&self.records(organization_id)?.data_locations))
    }

    async fn list_critical_functions(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CriticalFunction>> {
        Ok(live(&self.records(organization_id)?.critical_functions))
    }

    async fn list_subcontractors(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Subcontractor>> {
        Ok(live(&self.records(organization_id)?.subcontractors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "organizations": [{
            "organization_id": "acme",
            "reporting_entity": {
                "lei": "529900T8BM49AURSDO55",
                "name": "Acme Bank",
                "country": "DE",
                "entity_type": "credit_institution",
                "competent_authority": "BaFin",
                "currency": "EUR"
            },
            "providers": [
                {
                    "id": "549300MLUDYVRQOOXS22", "id_type": "lei", "name": "Cloudy",
                    "person_type": "legal", "country": "IE", "currency": "EUR",
                    "classification": "cloud_service_provider"
                },
                {
                    "id": "549300OLDPROVIDER0001", "id_type": "lei", "name": "Gone",
                    "person_type": "legal", "country": "IE", "currency": "EUR",
                    "classification": "other", "deleted_at": "2024-05-01T10:00:00Z"
                }
            ],
            "critical_functions": [{
                "id": "F-1", "entity_lei": "529900T8BM49AURSDO55", "name": "Payments",
                "is_critical": true,
                "assessment": { "framework": "dora", "reasons": "Core payment flow" }
            }]
        }]
    }"#;

    #[tokio::test]
    async fn test_soft_deleted_records_are_filtered() {
        let store = SnapshotStore::from_json(SNAPSHOT).unwrap();
        let org = OrganizationId::new("acme").unwrap();

        let providers = store.list_providers(&org).await.unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "Cloudy");
    }

    #[tokio::test]
    async fn test_assessment_variant_is_decoded() {
        let store = SnapshotStore::from_json(SNAPSHOT).unwrap();
        let org = OrganizationId::new("acme").unwrap();

        let functions = store.list_critical_functions(&org).await.unwrap();
        assert_eq!(
            functions[0].assessment.as_ref().map(|a| a.framework()),
            Some("dora")
        );
        assert!(store.list_contracts(&org).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_organization() {
        let store = SnapshotStore::from_json(SNAPSHOT).unwrap();
        let org = OrganizationId::new("other").unwrap();
        let err = store.reporting_entity(&org).await.unwrap_err();
        assert!(matches!(
            err,
            RoiError::Source(SourceError::OrganizationNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        let err = SnapshotStore::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RoiError::Source(SourceError::InvalidRecord { .. })));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = SnapshotStore::open("/nonexistent/snapshot.json")
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
