//! Export serialization
//!
//! Renders the requested template relations as CSV files, adds the package
//! metadata files and hashes everything into the manifest. Output depends on
//! the relations and options only, never on time or scheduling.

pub mod codec;
pub mod package;

pub use codec::{parse_relation, render_value, write_relation};
pub use package::{ExportPackage, Manifest, ManifestEntry, PackageFile, PackageStatus, MANIFEST_FILE};

use crate::core::registry::TemplateRegistry;
use crate::core::relation::RelationSet;
use crate::core::verification::checksum::sha256_hex;
use crate::domain::{Result, RoiError, TemplateCode};
use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::sync::Arc;
use tokio::task::JoinSet;

pub const PARAMETERS_FILE: &str = "parameters.csv";
pub const FILING_INDICATORS_FILE: &str = "FilingIndicators.csv";

/// Package-level values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHeader {
    pub entity_id: String,
    pub reporting_date: NaiveDate,
    pub status: PackageStatus,
}

/// What goes into a package besides the template files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Write `parameters.csv` and `FilingIndicators.csv`
    pub include_parameters: bool,
    pub base_currency: String,
    /// Fractional digits of monetary amounts
    pub decimals: u32,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            include_parameters: true,
            base_currency: "EUR".to_string(),
            decimals: 2,
        }
    }
}

/// Renders relations into export packages
pub struct Serializer {
    registry: Arc<TemplateRegistry>,
}

impl Serializer {
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self { registry }
    }

    /// Renders `templates` from `relations`
    ///
    /// Template files are rendered concurrently and listed in template code
    /// order, followed by the metadata files.
    pub async fn serialize(
        &self,
        header: &PackageHeader,
        relations: &RelationSet,
        templates: &[TemplateCode],
        options: &SerializeOptions,
    ) -> Result<ExportPackage> {
        let mut codes = templates.to_vec();
        codes.sort();
        codes.dedup();

        let mut tasks = JoinSet::new();
        for code in &codes {
            let descriptor = *self.registry.descriptor(*code)?;
            let relation = relations.get_shared(*code).ok_or_else(|| {
                RoiError::Serialization(format!("Template {code} was not built"))
            })?;
            tasks.spawn_blocking(move || {
                let content = write_relation(&relation, descriptor.fields)?;
                Ok::<_, RoiError>(PackageFile {
                    name: descriptor.code.file_name(),
                    template: Some(descriptor.code),
                    rows: relation.len(),
                    content,
                })
            });
        }

        let mut files = Vec::with_capacity(codes.len() + 2);
        while let Some(joined) = tasks.join_next().await {
            files.push(
                joined.map_err(|e| RoiError::Other(format!("Serialization task failed: {e}")))??,
            );
        }
        files.sort_by_key(|f| f.template);

        let template_count = files.len();
        let total_rows = files.iter().map(|f| f.rows).sum();

        if options.include_parameters {
            files.push(parameters_file(header, options)?);
            files.push(filing_indicators_file(&self.registry, relations, &codes)?);
        }

        let manifest = Manifest {
            entity_id: header.entity_id.clone(),
            reporting_date: header.reporting_date,
            status: header.status,
            template_count,
            total_rows,
            files: files
                .iter()
                .map(|f| ManifestEntry {
                    name: f.name.clone(),
                    template: f.template,
                    rows: f.rows,
                    sha256: sha256_hex(&f.content),
                })
                .collect(),
        };

        tracing::debug!(
            templates = template_count,
            rows = total_rows,
            status = header.status.as_str(),
            "Package rendered"
        );
        Ok(ExportPackage { manifest, files })
    }
}

fn csv_file(name: &str, records: &[[String; 2]]) -> Result<PackageFile> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    for record in records {
        writer.write_record(record)?;
    }
    let content = writer
        .into_inner()
        .map_err(|e| RoiError::Serialization(format!("Failed to flush {name}: {e}")))?;

    Ok(PackageFile {
        name: name.to_string(),
        template: None,
        rows: records.len().saturating_sub(1),
        content,
    })
}

fn parameters_file(header: &PackageHeader, options: &SerializeOptions) -> Result<PackageFile> {
    csv_file(
        PARAMETERS_FILE,
        &[
            ["name".to_string(), "value".to_string()],
            ["entityID".to_string(), format!("lei:{}", header.entity_id)],
            ["refPeriod".to_string(), header.reporting_date.format("%Y-%m-%d").to_string()],
            ["baseCurrency".to_string(), format!("iso4217:{}", options.base_currency)],
            ["decimalsMonetary".to_string(), options.decimals.to_string()],
        ],
    )
}

/// Every registered template, reported when it is in the package with at
/// least one row
fn filing_indicators_file(
    registry: &TemplateRegistry,
    relations: &RelationSet,
    packaged: &[TemplateCode],
) -> Result<PackageFile> {
    let mut records = vec![["templateID".to_string(), "reported".to_string()]];
    for code in registry.codes() {
        let reported = packaged.contains(&code)
            && relations.get(code).is_some_and(|r| !r.is_empty());
        records.push([code.to_string(), reported.to_string()]);
    }
    csv_file(FILING_INDICATORS_FILE, &records)
}
