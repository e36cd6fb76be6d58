//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use dora_roi::adapters::store::{MemoryStore, RecordStore, SnapshotStore};
use dora_roi::core::compile::{CompileContext, RegisterCompiler};
use dora_roi::core::sources::SourceSnapshot;
use dora_roi::domain::entities::SourceKind;
use dora_roi::domain::OrganizationId;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

pub const ORGANIZATION: &str = "acme-bank";

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("register.json")
}

pub fn organization() -> OrganizationId {
    OrganizationId::new(ORGANIZATION).unwrap()
}

pub fn reporting_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
}

pub fn context() -> CompileContext {
    CompileContext::new(organization(), reporting_date())
}

pub async fn snapshot_store() -> SnapshotStore {
    SnapshotStore::open(fixture_path()).await.unwrap()
}

/// Every live record of the fixture organization
pub async fn fixture_sources() -> SourceSnapshot {
    let store = snapshot_store().await;
    let kinds: BTreeSet<SourceKind> = [
        SourceKind::ReportingEntity,
        SourceKind::Providers,
        SourceKind::Contracts,
        SourceKind::Services,
        SourceKind::DataLocations,
        SourceKind::CriticalFunctions,
        SourceKind::Subcontractors,
    ]
    .into_iter()
    .collect();
    SourceSnapshot::load(&store, &organization(), &kinds)
        .await
        .unwrap()
}

pub fn compiler_over(store: impl RecordStore + 'static) -> RegisterCompiler {
    RegisterCompiler::new(Arc::new(store)).unwrap()
}

/// Compiler over the fixture records after `edit` has been applied
pub async fn compiler_with(edit: impl FnOnce(&mut SourceSnapshot)) -> RegisterCompiler {
    let mut sources = fixture_sources().await;
    edit(&mut sources);
    compiler_over(MemoryStore::with_organization(organization(), sources))
}
