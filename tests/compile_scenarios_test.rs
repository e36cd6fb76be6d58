//! End-to-end compilation scenarios over the JSON snapshot fixture

mod common;

use common::{compiler_over, compiler_with, context, snapshot_store};
use dora_roi::core::compile::{CompileOptions, CompileState, OnBlocked};
use dora_roi::core::serialize::PackageStatus;
use dora_roi::domain::{Severity, TemplateCode};
use dora_roi::domain::OrganizationId;

#[tokio::test]
async fn test_well_formed_register_is_ready() {
    let compiler = compiler_over(snapshot_store().await);
    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CompileState::Ready);
    assert!(result.findings.is_empty(), "{:#?}", result.findings);

    let package = result.package.expect("ready register has a package");
    assert_eq!(package.status(), PackageStatus::Final);
    assert_eq!(package.manifest.template_count, 15);
    assert_eq!(package.manifest.entity_id, "529900T8BM49AURSDO55");

    let template_files: Vec<_> = package.files.iter().filter(|f| f.template.is_some()).collect();
    assert_eq!(template_files.len(), 15);
    assert_eq!(
        package.manifest.total_rows,
        template_files.iter().map(|f| f.rows).sum::<usize>()
    );
}

#[tokio::test]
async fn test_manifest_row_counts_match_sources() {
    let compiler = compiler_over(snapshot_store().await);
    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();
    let manifest = result.package.unwrap().manifest;

    let rows = |name: &str| manifest.entry(name).map(|e| e.rows);
    assert_eq!(rows("B_01.01.csv"), Some(1));
    assert_eq!(rows("B_02.01.csv"), Some(2));
    // The soft-deleted provider never reaches the register
    assert_eq!(rows("B_05.01.csv"), Some(2));
    assert_eq!(rows("B_06.01.csv"), Some(2));
}

#[tokio::test]
async fn test_expiry_before_effective_blocks() {
    let compiler = compiler_with(|sources| {
        let contract = &mut sources.contracts[0];
        contract.effective_date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        contract.expiry_date = chrono::NaiveDate::from_ymd_opt(2024, 12, 31);
    })
    .await;

    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CompileState::Blocked);
    assert!(result.package.is_none());
    let finding = result
        .findings
        .iter()
        .find(|f| f.rule_id == "BUS-001")
        .expect("expiry before effective finding");
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.template, TemplateCode::B_02_01);
}

#[tokio::test]
async fn test_service_with_missing_contract_blocks() {
    let compiler = compiler_with(|sources| {
        sources.contracts.retain(|c| c.reference != "C-001");
    })
    .await;

    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CompileState::Blocked);
    assert!(result.findings.iter().any(|f| f.rule_id == "REF-001"
        && f.template == TemplateCode::B_02_02
        && f.message.contains("C-001")
        && f.is_error()));
}

#[tokio::test]
async fn test_critical_function_without_assessment_blocks() {
    let compiler = compiler_with(|sources| {
        let function = sources.functions.iter_mut().find(|f| f.is_critical).unwrap();
        function.assessment = None;
    })
    .await;

    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CompileState::Blocked);
    assert!(result
        .findings
        .iter()
        .any(|f| f.rule_id == "REQ-101" && f.template == TemplateCode::B_06_01));
}

#[tokio::test]
async fn test_critical_function_with_assessment_has_no_finding() {
    let compiler = compiler_over(snapshot_store().await);
    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();
    assert!(result.findings.iter().all(|f| f.rule_id != "REQ-101"));
}

#[tokio::test]
async fn test_malformed_provider_identifier_is_a_format_error() {
    let compiler = compiler_with(|sources| {
        sources.providers[0].id = "AB12".to_string();
    })
    .await;

    let result = compiler
        .compile(&context(), &CompileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CompileState::Blocked);
    let finding = result
        .findings
        .iter()
        .find(|f| f.rule_id == "FMT-101")
        .expect("format finding");
    assert_eq!(finding.severity, Severity::Error);
    assert_eq!(finding.template, TemplateCode::B_05_01);
    assert!(finding.message.contains("AB12"));
}

#[tokio::test]
async fn test_blocked_register_written_as_draft() {
    let compiler = compiler_with(|sources| {
        sources.providers[0].id = "AB12".to_string();
    })
    .await;
    let options = CompileOptions {
        on_blocked: OnBlocked::Draft,
        ..CompileOptions::default()
    };

    let result = compiler.compile(&context(), &options).await.unwrap();
    assert_eq!(result.status, CompileState::Blocked);
    assert!(!result.findings.is_empty());
    assert_eq!(result.package.unwrap().status(), PackageStatus::Draft);
}

#[tokio::test]
async fn test_unknown_organization_is_a_source_error() {
    let compiler = compiler_over(snapshot_store().await);
    let ctx = dora_roi::core::compile::CompileContext::new(
        OrganizationId::new("nobody").unwrap(),
        common::reporting_date(),
    );

    let err = compiler
        .compile(&ctx, &CompileOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 4);
}
