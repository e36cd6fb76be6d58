//! Source snapshot of one compilation run
//!
//! The snapshot is loaded once per run and is immutable afterwards. Every
//! entity list is sorted by primary key so that rows come out in a stable
//! order regardless of the order the store returned them in.

use crate::adapters::store::RecordStore;
use crate::domain::{
    Contract, CriticalFunction, DataLocation, OrganizationId, Provider, ReportingEntity, Result,
    Service, SourceKind, Subcontractor,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    pub entity: ReportingEntity,
    pub providers: Vec<Provider>,
    pub contracts: Vec<Contract>,
    pub services: Vec<Service>,
    pub data_locations: Vec<DataLocation>,
    pub functions: Vec<CriticalFunction>,
    pub subcontractors: Vec<Subcontractor>,
}

impl SourceSnapshot {
    /// Snapshot holding only the reporting entity
    pub fn new(entity: ReportingEntity) -> Self {
        Self {
            entity,
            providers: Vec::new(),
            contracts: Vec::new(),
            services: Vec::new(),
            data_locations: Vec::new(),
            functions: Vec::new(),
            subcontractors: Vec::new(),
        }
    }

    /// Loads the requested source kinds concurrently. The reporting entity is
    /// always loaded.
    pub async fn load(
        store: &dyn RecordStore,
        organization_id: &OrganizationId,
        kinds: &BTreeSet<SourceKind>,
    ) -> Result<Self> {
        let wanted = |kind| kinds.contains(&kind);

        let (entity, providers, contracts, services, data_locations, functions, subcontractors) = tokio::try_join!(
            store.reporting_entity(organization_id),
            async {
                if wanted(SourceKind::Providers) {
                    store.list_providers(organization_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if wanted(SourceKind::Contracts) {
                    store.list_contracts(organization_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if wanted(SourceKind::Services) {
                    store.list_services(organization_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if wanted(SourceKind::DataLocations) {
                    store.list_data_locations(organization_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if wanted(SourceKind::CriticalFunctions) {
                    store.list_critical_functions(organization_id).await
                } else {
                    Ok(Vec::new())
                }
            },
            async {
                if wanted(SourceKind::Subcontractors) {
                    store.list_subcontractors(organization_id).await
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        let snapshot = Self {
            entity,
            providers,
            contracts,
            services,
            data_locations,
            functions,
            subcontractors,
        }
        .normalized();

        tracing::debug!(
            organization_id = %organization_id,
            store = store.name(),
            counts = ?snapshot.counts(),
            "Source snapshot loaded"
        );

        Ok(snapshot)
    }

    /// Sorts every entity list by primary key
    pub fn normalized(mut self) -> Self {
        self.entity.branches.sort_by(|a, b| a.code.cmp(&b.code));
        self.entity
            .group_entities
            .sort_by(|a, b| a.lei.cmp(&b.lei));
        self.entity
            .responsible_persons
            .sort_by(|a, b| a.name.cmp(&b.name));
        self.providers.sort_by(|a, b| a.id.cmp(&b.id));
        self.contracts.sort_by(|a, b| a.id.cmp(&b.id));
        self.services.sort_by(|a, b| a.id.cmp(&b.id));
        self.data_locations.sort_by(|a, b| a.id.cmp(&b.id));
        self.functions.sort_by(|a, b| a.id.cmp(&b.id));
        for function in &mut self.functions {
            function.service_ids.sort();
            function.service_ids.dedup();
        }
        self.subcontractors.sort_by(|a, b| a.id.cmp(&b.id));
        self
    }

    /// Record count per source kind
    pub fn counts(&self) -> BTreeMap<SourceKind, usize> {
        BTreeMap::from([
            (SourceKind::ReportingEntity, 1),
            (SourceKind::Providers, self.providers.len()),
            (SourceKind::Contracts, self.contracts.len()),
            (SourceKind::Services, self.services.len()),
            (SourceKind::DataLocations, self.data_locations.len()),
            (SourceKind::CriticalFunctions, self.functions.len()),
            (SourceKind::Subcontractors, self.subcontractors.len()),
        ])
    }
}
