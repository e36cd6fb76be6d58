//! Plan command implementation
//!
//! Prints the build order, the build waves and the rule catalog without
//! reading any data.

use crate::core::compile::TemplateSelection;
use crate::core::registry::TemplateRegistry;
use crate::core::resolver::{self, BuildPlan};
use crate::core::validation::ValidationEngine;
use crate::domain::Result;
use clap::Args;
use std::sync::Arc;

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Templates to plan for (comma-separated); all when omitted
    #[arg(long, value_delimiter = ',')]
    pub templates: Vec<String>,
}

impl PlanArgs {
    fn resolve(&self, registry: &TemplateRegistry) -> Result<BuildPlan> {
        let selection = TemplateSelection::parse(&self.templates)
            .map_err(crate::domain::RoiError::Configuration)?;
        let requested = selection.resolve(registry)?;
        Ok(resolver::plan_for(registry, &requested)?)
    }

    /// Execute the plan command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let registry = match TemplateRegistry::standard() {
            Ok(r) => Arc::new(r),
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };
        let plan = match self.resolve(&registry) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };
        let engine = match ValidationEngine::standard(Arc::clone(&registry)) {
            Ok(e) => e,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        println!("🗺️  Build plan ({} templates)", plan.len());
        println!();
        for (i, code) in plan.order.iter().enumerate() {
            let title = registry.get(*code).map_or("", |d| d.title);
            println!("  {:>2}. {code}  {title}", i + 1);
        }

        println!();
        println!("🌊 Build waves");
        for (i, wave) in plan.waves.iter().enumerate() {
            let codes: Vec<String> = wave.iter().map(ToString::to_string).collect();
            println!("  Wave {}: {}", i + 1, codes.join(", "));
        }

        println!();
        println!("📏 Rules ({} total)", engine.rules().len());
        for (category, count) in engine.rule_counts() {
            println!("  {category}: {count}");
        }
        Ok(0)
    }
}
