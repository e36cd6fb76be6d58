//! Register compiler - main orchestrator of a compilation run
//!
//! Coordinates the resolver, the builder, the validation engine and the
//! serializer for one (organization, reporting date) pair. Per-template
//! validation runs while later build waves are still in progress; cross
//! template rules wait until every relation exists.

use crate::adapters::store::RecordStore;
use crate::core::builder::TemplateBuilder;
use crate::core::compile::options::{CompileContext, CompileOptions, OnBlocked};
use crate::core::compile::state::{CompileState, StateMachine};
use crate::core::compile::summary::CompileSummary;
use crate::core::registry::TemplateRegistry;
use crate::core::relation::RelationSet;
use crate::core::resolver::{self, BuildPlan};
use crate::core::serialize::{
    ExportPackage, PackageHeader, PackageStatus, SerializeOptions, Serializer,
};
use crate::core::sources::SourceSnapshot;
use crate::core::validation::{apply_level, RuleContext, ValidationEngine};
use crate::domain::{FindingsExt, Result, RoiError, ValidationFinding};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Outcome of a compilation
#[derive(Debug)]
pub struct CompileResult {
    /// `Ready` or `Blocked`
    pub status: CompileState,
    /// Every finding, sorted by template, row and rule
    pub findings: Vec<ValidationFinding>,
    /// Final package when ready, draft package when blocked and drafts are
    /// enabled
    pub package: Option<ExportPackage>,
    /// Materialized relations, prerequisites included
    pub relations: RelationSet,
    pub summary: CompileSummary,
}

impl CompileResult {
    pub fn is_ready(&self) -> bool {
        self.status == CompileState::Ready
    }
}

/// Register compiler
pub struct RegisterCompiler {
    store: Arc<dyn RecordStore>,
    registry: Arc<TemplateRegistry>,
    engine: Arc<ValidationEngine>,
    serializer: Serializer,
}

impl RegisterCompiler {
    /// Compiler over the standard templates and rule catalog
    pub fn new(store: Arc<dyn RecordStore>) -> Result<Self> {
        let registry = Arc::new(TemplateRegistry::standard()?);
        let engine = ValidationEngine::standard(Arc::clone(&registry))?;
        Ok(Self::with_registry(store, registry, engine))
    }

    /// Compiler over a custom registry and rule set
    pub fn with_registry(
        store: Arc<dyn RecordStore>,
        registry: Arc<TemplateRegistry>,
        engine: ValidationEngine,
    ) -> Self {
        Self {
            store,
            serializer: Serializer::new(Arc::clone(&registry)),
            registry,
            engine: Arc::new(engine),
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Build plan of the templates selected by `options`
    pub fn plan(&self, options: &CompileOptions) -> Result<BuildPlan> {
        let requested = options.templates.resolve(&self.registry)?;
        Ok(resolver::plan_for(&self.registry, &requested)?)
    }

    /// Runs a full compilation
    ///
    /// # Errors
    ///
    /// Registry and rule errors abort before the store is read. Store
    /// failures abort the run. Data problems never fail the run; they are
    /// returned as findings.
    pub async fn compile(
        &self,
        ctx: &CompileContext,
        options: &CompileOptions,
    ) -> Result<CompileResult> {
        let started = Instant::now();
        crate::log_compile_start!(&ctx.organization_id, ctx.reporting_date);

        let mut machine = StateMachine::new();
        let requested = options.templates.resolve(&self.registry)?;
        let plan = resolver::plan_for(&self.registry, &requested)?;
        tracing::debug!(
            requested = requested.len(),
            planned = plan.len(),
            waves = plan.waves.len(),
            "Build plan resolved"
        );

        let builder = TemplateBuilder::new(Arc::clone(&self.registry), options.build_concurrency);
        let kinds = builder.source_kinds(&plan);
        let sources = Arc::new(
            SourceSnapshot::load(self.store.as_ref(), &ctx.organization_id, &kinds).await?,
        );

        let rule_ctx = RuleContext::new(ctx.reporting_date, options.expiry_warning_days);
        let (built_tx, built_rx) = mpsc::unbounded_channel();
        let intra = tokio::spawn(Arc::clone(&self.engine).validate_incoming(built_rx, rule_ctx));

        let relations = match builder
            .build(&plan, Arc::clone(&sources), ctx.reporting_date, Some(built_tx))
            .await
        {
            Ok(relations) => relations,
            Err(e) => {
                intra.abort();
                crate::log_error_with_context!(&e, "Template build failed");
                return Err(e);
            }
        };
        machine.transition(CompileState::Built)?;

        let mut findings = intra
            .await
            .map_err(|e| RoiError::Other(format!("Validation task failed: {e}")))??;
        findings.extend(self.engine.validate_cross(&relations, &rule_ctx));
        findings.sort();
        let findings = apply_level(findings, options.validation_level);
        machine.transition(CompileState::Validated)?;

        let status = if findings.has_errors() {
            CompileState::Blocked
        } else {
            CompileState::Ready
        };
        machine.transition(status)?;

        let package_status = match (status, options.on_blocked) {
            (CompileState::Ready, _) => Some(PackageStatus::Final),
            (_, OnBlocked::Draft) => Some(PackageStatus::Draft),
            (_, OnBlocked::Skip) => None,
        };
        let package = match package_status {
            Some(package_status) => {
                let header = PackageHeader {
                    entity_id: sources.entity.lei.clone(),
                    reporting_date: ctx.reporting_date,
                    status: package_status,
                };
                let serialize_options = SerializeOptions {
                    include_parameters: options.include_parameters,
                    base_currency: options.base_currency.clone(),
                    ..SerializeOptions::default()
                };
                Some(
                    self.serializer
                        .serialize(&header, &relations, &requested, &serialize_options)
                        .await?,
                )
            }
            None => {
                tracing::warn!("Register blocked, serialization skipped");
                None
            }
        };

        let mut summary = CompileSummary {
            organization_id: ctx.organization_id.clone(),
            reporting_date: ctx.reporting_date,
            status,
            templates_built: relations.len(),
            templates_exported: package.as_ref().map_or(0, |p| p.manifest.template_count),
            total_rows: relations.total_rows(),
            rule_count: self.engine.rules().len(),
            errors: 0,
            warnings: 0,
            findings_by_category: BTreeMap::new(),
            package_written: package.is_some(),
            duration: started.elapsed(),
        };
        summary.tally(&findings);
        summary.log_summary();

        Ok(CompileResult {
            status,
            findings,
            package,
            relations,
            summary,
        })
    }

    /// Runs validation alone against already materialized relations
    ///
    /// Returns the same findings on every call for the same input.
    pub fn revalidate(
        &self,
        relations: &RelationSet,
        ctx: &CompileContext,
        options: &CompileOptions,
    ) -> Vec<ValidationFinding> {
        let rule_ctx = RuleContext::new(ctx.reporting_date, options.expiry_warning_days);
        apply_level(self.engine.validate(relations, &rule_ctx), options.validation_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryStore;
    use crate::core::compile::options::TemplateSelection;
    use crate::core::registry::templates::fixtures;
    use crate::core::validation::ValidationLevel;
    use crate::domain::{OrganizationId, Severity, TemplateCode};

    fn context() -> CompileContext {
        CompileContext::new(OrganizationId::new("acme").unwrap(), fixtures::reporting_date())
    }

    fn compiler(sources: crate::core::sources::SourceSnapshot) -> RegisterCompiler {
        let store = MemoryStore::with_organization(context().organization_id, sources);
        RegisterCompiler::new(Arc::new(store)).unwrap()
    }

    #[tokio::test]
    async fn test_clean_register_is_ready() {
        let result = compiler(fixtures::snapshot())
            .compile(&context(), &CompileOptions::default())
            .await
            .unwrap();

        assert_eq!(result.status, CompileState::Ready);
        assert!(result.findings.is_empty(), "{:#?}", result.findings);
        let package = result.package.unwrap();
        assert_eq!(package.status(), PackageStatus::Final);
        assert_eq!(package.manifest.template_count, 15);
        assert_eq!(result.summary.templates_built, 15);
    }

    #[tokio::test]
    async fn test_blocked_register_skips_package() {
        let mut sources = fixtures::snapshot();
        sources.contracts[0].expiry_date = Some(fixtures::date(2023, 12, 31));

        let result = compiler(sources)
            .compile(&context(), &CompileOptions::default())
            .await
            .unwrap();

        assert_eq!(result.status, CompileState::Blocked);
        assert!(result.package.is_none());
        assert!(result.findings.iter().any(|f| f.rule_id == "BUS-001"));
        assert!(!result.summary.package_written);
    }

    #[tokio::test]
    async fn test_blocked_register_writes_draft() {
        let mut sources = fixtures::snapshot();
        sources.contracts[0].expiry_date = Some(fixtures::date(2023, 12, 31));
        let options = CompileOptions {
            on_blocked: OnBlocked::Draft,
            ..CompileOptions::default()
        };

        let result = compiler(sources).compile(&context(), &options).await.unwrap();
        assert_eq!(result.status, CompileState::Blocked);
        assert_eq!(result.package.unwrap().status(), PackageStatus::Draft);
    }

    #[tokio::test]
    async fn test_strict_mode_blocks_on_warnings() {
        let mut sources = fixtures::snapshot();
        sources.services[0].last_audit_date = None;
        let compiler = compiler(sources);

        let lenient = compiler
            .compile(&context(), &CompileOptions::default())
            .await
            .unwrap();
        assert_eq!(lenient.status, CompileState::Ready);
        assert_eq!(lenient.findings.len(), 1);
        assert_eq!(lenient.findings[0].severity, Severity::Warning);

        let strict = compiler
            .compile(
                &context(),
                &CompileOptions {
                    validation_level: ValidationLevel::Strict,
                    ..CompileOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(strict.status, CompileState::Blocked);
        assert!(strict.package.is_none());
    }

    #[tokio::test]
    async fn test_subset_exports_only_requested_templates() {
        let options = CompileOptions {
            templates: TemplateSelection::Subset(vec![TemplateCode::B_03_02]),
            ..CompileOptions::default()
        };
        let result = compiler(fixtures::snapshot())
            .compile(&context(), &options)
            .await
            .unwrap();

        assert_eq!(result.relations.len(), 3);
        let package = result.package.unwrap();
        assert_eq!(package.manifest.template_count, 1);
        assert_eq!(package.files[0].template, Some(TemplateCode::B_03_02));
    }

    #[tokio::test]
    async fn test_unknown_organization_is_a_source_error() {
        let compiler = compiler(fixtures::snapshot());
        let ctx = CompileContext::new(OrganizationId::new("other").unwrap(), fixtures::reporting_date());
        let err = compiler.compile(&ctx, &CompileOptions::default()).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_revalidate_matches_compile() {
        let mut sources = fixtures::snapshot();
        sources.services[1].contract_reference = "C-404".to_string();
        let compiler = compiler(sources);
        let options = CompileOptions::default();

        let result = compiler.compile(&context(), &options).await.unwrap();
        let again = compiler.revalidate(&result.relations, &context(), &options);
        assert_eq!(again, result.findings);
        assert_eq!(again, compiler.revalidate(&result.relations, &context(), &options));
    }
}
