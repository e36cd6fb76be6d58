//! Compile command implementation
//!
//! Builds, validates and packages the register of one organization for one
//! reporting date.

use crate::adapters::create_store;
use crate::config::load_config;
use crate::core::compile::{
    CompileContext, CompileOptions, OnBlocked, RegisterCompiler, TemplateSelection,
};
use crate::core::validation::ValidationLevel;
use crate::domain::{OrganizationId, ValidationFinding};
use chrono::NaiveDate;
use clap::Args;
use std::path::{Path, PathBuf};

/// Maximum findings printed to the console; the findings file holds all
const PRINTED_FINDINGS: usize = 50;

/// Arguments for the compile command
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Organization whose register is compiled
    #[arg(long, env = "ROI_ORGANIZATION_ID")]
    pub org: String,

    /// Reporting reference date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_reporting_date)]
    pub date: NaiveDate,

    /// Templates to export (comma-separated, e.g. B_01.01,B_05.01)
    #[arg(long, value_delimiter = ',')]
    pub templates: Vec<String>,

    /// Escalate warnings to errors
    #[arg(long)]
    pub strict: bool,

    /// Write a draft package when the register is blocked
    #[arg(long)]
    pub draft: bool,

    /// Package output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace an existing package in the output directory
    #[arg(long)]
    pub overwrite: bool,

    /// Write every finding as JSON to this file
    #[arg(long)]
    pub findings_file: Option<PathBuf>,
}

fn parse_reporting_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}' (expected YYYY-MM-DD): {e}"))
}

impl CompileArgs {
    /// Applies command-line overrides on top of the configured options
    fn apply_overrides(&self, options: &mut CompileOptions) -> Result<(), String> {
        if !self.templates.is_empty() {
            options.templates = TemplateSelection::parse(&self.templates)?;
        }
        if self.strict {
            options.validation_level = ValidationLevel::Strict;
        }
        if self.draft {
            options.on_blocked = OnBlocked::Draft;
        }
        Ok(())
    }

    /// Execute the compile command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let mut options = match config.compile_options() {
            Ok(o) => o,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };
        if let Err(e) = self.apply_overrides(&mut options) {
            eprintln!("❌ {e}");
            return Ok(2);
        }

        let organization_id = match OrganizationId::new(self.org.as_str()) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };
        let ctx = CompileContext::new(organization_id, self.date);

        println!(
            "🏗️  Compiling register for {} at {}",
            ctx.organization_id, ctx.reporting_date
        );

        let store = match create_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Failed to open record store");
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let compiler = match RegisterCompiler::new(store) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(e.exit_code());
            }
        };

        let result = match compiler.compile(&ctx, &options).await {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ Compilation failed: {e}");
                return Ok(e.exit_code());
            }
        };

        print_findings(&result.findings);

        if let Some(path) = &self.findings_file {
            write_findings(path, &result.findings).await?;
            println!("📝 Findings written to {}", path.display());
        }

        let summary = &result.summary;
        println!();
        println!("📊 Compilation Summary");
        println!("  Status: {}", summary.status);
        println!("  Templates built: {}", summary.templates_built);
        println!("  Rows: {}", summary.total_rows);
        println!("  Rules evaluated: {}", summary.rule_count);
        println!("  Errors: {}", summary.errors);
        println!("  Warnings: {}", summary.warnings);
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

        if let Some(package) = &result.package {
            let dir = self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.directory));
            let overwrite = self.overwrite || config.output.overwrite;
            match package.write_to_dir(&dir, overwrite).await {
                Ok(manifest) => {
                    println!(
                        "📦 {} package written: {} ({} templates, {} rows)",
                        package.status().as_str(),
                        manifest.display(),
                        package.manifest.template_count,
                        package.manifest.total_rows
                    );
                }
                Err(e) => {
                    eprintln!("❌ Failed to write package: {e}");
                    return Ok(e.exit_code());
                }
            }
        } else {
            println!("⛔ Register blocked, no package written (use --draft to write a draft)");
        }

        if result.is_ready() {
            println!("✅ Register ready for submission");
            Ok(0)
        } else {
            println!("⚠️  Register blocked by {} error finding(s)", summary.errors);
            Ok(1)
        }
    }
}

fn print_findings(findings: &[ValidationFinding]) {
    if findings.is_empty() {
        return;
    }
    println!();
    println!("🔎 Findings");
    for finding in findings.iter().take(PRINTED_FINDINGS) {
        let icon = if finding.is_error() { "❌" } else { "⚠️ " };
        println!("  {icon} {finding}");
    }
    if findings.len() > PRINTED_FINDINGS {
        println!(
            "  ... and {} more (use --findings-file for the full list)",
            findings.len() - PRINTED_FINDINGS
        );
    }
}

async fn write_findings(path: &Path, findings: &[ValidationFinding]) -> anyhow::Result<()> {
    let mut json = serde_json::to_vec_pretty(findings)?;
    json.push(b'\n');
    tokio::fs::write(path, json).await?;
    Ok(())
}
