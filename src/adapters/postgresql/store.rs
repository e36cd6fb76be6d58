//! Record store over the normalized PostgreSQL tables
//!
//! Table layout: `migrations/001_register_schema.sql`. Every query is scoped
//! by `organization_id` and skips soft-deleted rows.

use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::store::RecordStore;
use crate::config::schema::PostgreSQLConfig;
use crate::domain::{
    Contract, CriticalFunction, DataLocation, OrganizationId, Provider, ReportingEntity, Result,
    Service, SourceError, SourceKind, Subcontractor,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_postgres::types::FromSql;
use tokio_postgres::Row;

/// Schema the store reads from
pub const SCHEMA_SQL: &str = include_str!("../../../migrations/001_register_schema.sql");

const REPORTING_ENTITY_QUERY: &str = "SELECT lei, name, country, entity_type, competent_authority, \
     currency, total_assets, branches, responsible_persons, group_entities \
     FROM roi_reporting_entities WHERE organization_id = $1 AND deleted_at IS NULL";

const PROVIDERS_QUERY: &str = "SELECT id, id_type, name, name_latin, person_type, country, \
     currency, classification, intra_group, parent_id \
     FROM roi_providers WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY id";

const CONTRACTS_QUERY: &str = "SELECT id, reference, entity_lei, provider_id, contract_type, \
     overarching_reference, effective_date, expiry_date, governing_law_country, \
     notice_period_entity_days, notice_period_provider_days, termination_reason, currency, \
     annual_cost, using_branch \
     FROM roi_contracts WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY id";

const SERVICES_QUERY: &str = "SELECT id, contract_reference, classification, criticality, \
     country_of_provision, availability_target, recovery_time_minutes, recovery_point_minutes, \
     personal_data, data_categories, substitutability, exit_plan, reintegration_possible, \
     last_audit_date, alternative_providers \
     FROM roi_services WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY id";

const DATA_LOCATIONS_QUERY: &str = "SELECT id, service_id, country, location_type, sensitivity \
     FROM roi_data_locations WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY id";

const CRITICAL_FUNCTIONS_QUERY: &str = "SELECT id, entity_lei, name, licensed_activity, \
     is_critical, assessment, service_ids, recovery_time_minutes, recovery_point_minutes \
     FROM roi_critical_functions WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY id";

const SUBCONTRACTORS_QUERY: &str = "SELECT id, name, country, provider_id, parent_id, tier, \
     service_id \
     FROM roi_subcontractors WHERE organization_id = $1 AND deleted_at IS NULL ORDER BY id";

/// Typed column access with decode failures reported as source errors
struct Columns<'a> {
    row: &'a Row,
    kind: SourceKind,
}

impl<'a> Columns<'a> {
    fn new(row: &'a Row, kind: SourceKind) -> Self {
        Self { row, kind }
    }

    fn get<T: FromSql<'a>>(&self, column: &str) -> Result<T> {
        self.row.try_get(column).map_err(|e| {
            SourceError::InvalidRecord {
                kind: self.kind.to_string(),
                message: format!("column {}: {}", column, e),
            }
            .into()
        })
    }

    /// Decodes a JSONB column
    fn json<T: DeserializeOwned>(&self, column: &str) -> Result<T> {
        let value: serde_json::Value = self.get(column)?;
        serde_json::from_value(value).map_err(|e| {
            SourceError::InvalidRecord {
                kind: self.kind.to_string(),
                message: format!("column {}: {}", column, e),
            }
            .into()
        })
    }

    fn json_opt<T: DeserializeOwned>(&self, column: &str) -> Result<Option<T>> {
        let value: Option<serde_json::Value> = self.get(column)?;
        value
            .map(|v| {
                serde_json::from_value(v).map_err(|e| {
                    SourceError::InvalidRecord {
                        kind: self.kind.to_string(),
                        message: format!("column {}: {}", column, e),
                    }
                    .into()
                })
            })
            .transpose()
    }
}

fn reporting_entity_from_row(row: &Row) -> Result<ReportingEntity> {
    let c = Columns::new(row, SourceKind::ReportingEntity);
    Ok(ReportingEntity {
        lei: c.get("lei")?,
        name: c.get("name")?,
        country: c.get("country")?,
        entity_type: c.get("entity_type")?,
        competent_authority: c.get("competent_authority")?,
        currency: c.get("currency")?,
        total_assets: c.get("total_assets")?,
        branches: c.json("branches")?,
        responsible_persons: c.json("responsible_persons")?,
        group_entities: c.json("group_entities")?,
    })
}

fn provider_from_row(row: &Row) -> Result<Provider> {
    let c = Columns::new(row, SourceKind::Providers);
    Ok(Provider {
        id: c.get("id")?,
        id_type: c.get("id_type")?,
        name: c.get("name")?,
        name_latin: c.get("name_latin")?,
        person_type: c.get("person_type")?,
        country: c.get("country")?,
        currency: c.get("currency")?,
        classification: c.get("classification")?,
        intra_group: c.get("intra_group")?,
        parent_id: c.get("parent_id")?,
    })
}

fn contract_from_row(row: &Row) -> Result<Contract> {
    let c = Columns::new(row, SourceKind::Contracts);
    Ok(Contract {
        id: c.get("id")?,
        reference: c.get("reference")?,
        entity_lei: c.get("entity_lei")?,
        provider_id: c.get("provider_id")?,
        contract_type: c.get("contract_type")?,
        overarching_reference: c.get("overarching_reference")?,
        effective_date: c.get("effective_date")?,
        expiry_date: c.get("expiry_date")?,
        governing_law_country: c.get("governing_law_country")?,
        notice_period_entity_days: c.get("notice_period_entity_days")?,
        notice_period_provider_days: c.get("notice_period_provider_days")?,
        termination_reason: c.get("termination_reason")?,
        currency: c.get("currency")?,
        annual_cost: c.get("annual_cost")?,
        using_branch: c.get("using_branch")?,
    })
}

fn service_from_row(row: &Row) -> Result<Service> {
    let c = Columns::new(row, SourceKind::Services);
    Ok(Service {
        id: c.get("id")?,
        contract_reference: c.get("contract_reference")?,
        classification: c.get("classification")?,
        criticality: c.get("criticality")?,
        country_of_provision: c.get("country_of_provision")?,
        availability_target: c.get("availability_target")?,
        recovery_time_minutes: c.get("recovery_time_minutes")?,
        recovery_point_minutes: c.get("recovery_point_minutes")?,
        personal_data: c.get("personal_data")?,
        data_categories: c.get("data_categories")?,
        substitutability: c.get("substitutability")?,
        exit_plan: c.get("exit_plan")?,
        reintegration_possible: c.get("reintegration_possible")?,
        last_audit_date: c.get("last_audit_date")?,
        alternative_providers: c.get("alternative_providers")?,
    })
}

fn data_location_from_row(row: &Row) -> Result<DataLocation> {
    let c = Columns::new(row, SourceKind::DataLocations);
    Ok(DataLocation {
        id: c.get("id")?,
        service_id: c.get("service_id")?,
        country: c.get("country")?,
        location_type: c.get("location_type")?,
        sensitivity: c.get("sensitivity")?,
    })
}

fn critical_function_from_row(row: &Row) -> Result<CriticalFunction> {
    let c = Columns::new(row, SourceKind::CriticalFunctions);
    Ok(CriticalFunction {
        id: c.get("id")?,
        entity_lei: c.get("entity_lei")?,
        name: c.get("name")?,
        licensed_activity: c.get("licensed_activity")?,
        is_critical: c.get("is_critical")?,
        assessment: c.json_opt("assessment")?,
        service_ids: c.get("service_ids")?,
        recovery_time_minutes: c.get("recovery_time_minutes")?,
        recovery_point_minutes: c.get("recovery_point_minutes")?,
    })
}

fn subcontractor_from_row(row: &Row) -> Result<Subcontractor> {
    let c = Columns::new(row, SourceKind::Subcontractors);
    Ok(Subcontractor {
        id: c.get("id")?,
        name: c.get("name")?,
        country: c.get("country")?,
        provider_id: c.get("provider_id")?,
        parent_id: c.get("parent_id")?,
        tier: c.get("tier")?,
        service_id: c.get("service_id")?,
    })
}

/// Record store backed by PostgreSQL
pub struct PostgresStore {
    client: PostgreSQLClient,
}

impl PostgresStore {
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        Ok(Self {
            client: PostgreSQLClient::new(config)?,
        })
    }

    pub fn client(&self) -> &PostgreSQLClient {
        &self.client
    }

    async fn list<T>(
        &self,
        kind: SourceKind,
        query: &str,
        organization_id: &OrganizationId,
        decode: fn(&Row) -> Result<T>,
    ) -> Result<Vec<T>> {
        let rows = self.client.query(query, &[&organization_id.as_str()]).await?;
        tracing::debug!(
            organization_id = %organization_id,
            kind = %kind,
            rows = rows.len(),
            "Loaded records"
        );
        rows.iter().map(decode).collect()
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn reporting_entity(&self, organization_id: &OrganizationId) -> Result<ReportingEntity> {
        let rows = self
            .client
            .query(REPORTING_ENTITY_QUERY, &[&organization_id.as_str()])
            .await?;
        match rows.first() {
            Some(row) => reporting_entity_from_row(row),
            None => Err(SourceError::OrganizationNotFound(organization_id.to_string()).into()),
        }
    }

    async fn list_providers(&self, organization_id: &OrganizationId) -> Result<Vec<Provider>> {
        self.list(SourceKind::Providers, PROVIDERS_QUERY, organization_id, provider_from_row)
            .await
    }

    async fn list_contracts(&self, organization_id: &OrganizationId) -> Result<Vec<Contract>> {
        self.list(SourceKind::Contracts, CONTRACTS_QUERY, organization_id, contract_from_row)
            .await
    }

    async fn list_services(&self, organization_id: &OrganizationId) -> Result<Vec<Service>> {
        self.list(SourceKind::Services, SERVICES_QUERY, organization_id, service_from_row)
            .await
    }

    async fn list_data_locations(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<DataLocation>> {
        self.list(
            SourceKind::DataLocations,
            DATA_LOCATIONS_QUERY,
            organization_id,
            data_location_from_row,
        )
        .await
    }

    async fn list_critical_functions(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<CriticalFunction>> {
        self.list(
            SourceKind::CriticalFunctions,
            CRITICAL_FUNCTIONS_QUERY,
            organization_id,
            critical_function_from_row,
        )
        .await
    }

    async fn list_subcontractors(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Subcontractor>> {
        self.list(
            SourceKind::Subcontractors,
            SUBCONTRACTORS_QUERY,
            organization_id,
            subcontractor_from_row,
        )
        .await
    }
}
