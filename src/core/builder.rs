//! Template builder
//!
//! Materializes the planned templates wave by wave. The templates of one wave
//! run on blocking workers, bounded by the configured concurrency, against a
//! frozen view of the relations built so far. Each worker produces its own
//! relation; the builder merges them into the relation set once the wave is
//! complete.

use crate::core::registry::{BuildContext, TemplateRegistry};
use crate::core::relation::{Relation, RelationSet};
use crate::core::resolver::BuildPlan;
use crate::core::sources::SourceSnapshot;
use crate::domain::{Result, RoiError, SourceKind, TemplateCode};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Builds template relations from a source snapshot
pub struct TemplateBuilder {
    registry: Arc<TemplateRegistry>,
    limiter: Arc<Semaphore>,
}

impl TemplateBuilder {
    pub fn new(registry: Arc<TemplateRegistry>, concurrency: usize) -> Self {
        Self {
            registry,
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Source kinds read by the planned templates
    pub fn source_kinds(&self, plan: &BuildPlan) -> BTreeSet<SourceKind> {
        let mut kinds = BTreeSet::from([SourceKind::ReportingEntity]);
        for code in &plan.order {
            if let Some(descriptor) = self.registry.get(*code) {
                kinds.extend(descriptor.sources.iter().copied());
            }
        }
        kinds
    }

    /// Materializes every template of the plan
    ///
    /// Each relation is sent to `built` as soon as it is complete, so that
    /// per-template validation can start before the whole register exists.
    pub async fn build(
        &self,
        plan: &BuildPlan,
        sources: Arc<SourceSnapshot>,
        reporting_date: NaiveDate,
        built: Option<UnboundedSender<Arc<Relation>>>,
    ) -> Result<RelationSet> {
        let mut relations = RelationSet::new();

        for (index, wave) in plan.waves.iter().enumerate() {
            let frozen = Arc::new(relations.clone());
            let mut tasks = JoinSet::new();

            for &code in wave {
                let permit = self
                    .limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| RoiError::Other(format!("Build limiter closed: {e}")))?;
                let registry = Arc::clone(&self.registry);
                let sources = Arc::clone(&sources);
                let frozen = Arc::clone(&frozen);

                tasks.spawn_blocking(move || {
                    let _permit = permit;
                    build_template(&registry, code, reporting_date, &sources, &frozen)
                });
            }

            let mut finished = Vec::with_capacity(wave.len());
            while let Some(joined) = tasks.join_next().await {
                let relation = joined
                    .map_err(|e| RoiError::Other(format!("Template build task failed: {e}")))??;
                let relation = Arc::new(relation);
                if let Some(sender) = &built {
                    // the receiver may have stopped listening; the build goes on
                    let _ = sender.send(Arc::clone(&relation));
                }
                finished.push(relation);
            }

            for relation in finished {
                relations.insert_shared(relation);
            }
            tracing::debug!(wave = index, templates = wave.len(), "Build wave complete");
        }

        Ok(relations)
    }
}

/// Builds one template against already materialized prerequisites
pub fn build_template(
    registry: &TemplateRegistry,
    code: TemplateCode,
    reporting_date: NaiveDate,
    sources: &SourceSnapshot,
    relations: &RelationSet,
) -> Result<Relation> {
    let started = Instant::now();
    let descriptor = registry.descriptor(code)?;

    let ctx = BuildContext::new(reporting_date, sources, relations, registry);
    let rows = (descriptor.build)(&ctx);
    let relation = Relation::new(code, descriptor.columns(), rows)?;

    crate::log_template_built!(code, relation.len(), started.elapsed().as_millis());
    Ok(relation)
}
