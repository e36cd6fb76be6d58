//! Core compilation pipeline
//!
//! - [`registry`] - Template descriptors and the standard template set
//! - [`resolver`] - Dependency ordering and build waves
//! - [`sources`] - Per-run snapshot of the record store
//! - [`relation`] - Materialized template rows
//! - [`builder`] - Concurrent template materialization
//! - [`validation`] - Rule catalog and validation engine
//! - [`serialize`] - CSV rendering and export packages
//! - [`compile`] - Orchestration of a compilation run
//! - [`verification`] - Package checksums and resubmission diffs
//!
//! # Example
//!
//! ```rust,no_run
//! use dora_roi::adapters::store::SnapshotStore;
//! use dora_roi::core::compile::{CompileContext, CompileOptions, RegisterCompiler};
//! use dora_roi::domain::OrganizationId;
//! use chrono::NaiveDate;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SnapshotStore::open("records.json").await?);
//! let compiler = RegisterCompiler::new(store)?;
//!
//! let ctx = CompileContext::new(
//!     OrganizationId::new("acme-bank")?,
//!     NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
//! );
//! let result = compiler.compile(&ctx, &CompileOptions::default()).await?;
//!
//! for finding in &result.findings {
//!     println!("{finding}");
//! }
//! if let Some(package) = &result.package {
//!     package.write_to_dir(Path::new("./register"), false).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod compile;
pub mod registry;
pub mod relation;
pub mod resolver;
pub mod serialize;
pub mod sources;
pub mod validation;
pub mod verification;
