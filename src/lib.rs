// DORA RoI - Register of Information compiler
// Copyright (c) 2025 DORA RoI Contributors
// Licensed under the MIT License

//! # DORA RoI - Register of Information compiler
//!
//! Compiles the DORA Register of Information of a financial entity from its
//! normalized records: third-party providers, contractual arrangements, ICT
//! services, data locations, critical functions and supply chains.
//!
//! A compilation materializes the regulatory templates in dependency order,
//! validates them against the rule catalog and, when no error finding
//! remains, writes a deterministic CSV package with a checksummed manifest.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface
//! - [`core`] - Registry, resolver, builder, validation, serialization
//! - [`adapters`] - Record stores (in-memory, JSON snapshot, PostgreSQL)
//! - [`domain`] - Source entities, identifiers, findings and errors
//! - [`config`] - `roi.toml` loading and validation
//! - [`logging`] - Structured logging
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`]. Data problems never surface as
//! errors; they are [`domain::ValidationFinding`]s in the compile result.
//!
//! ```rust
//! use dora_roi::domain::{RegistryError, RoiError};
//!
//! let err: RoiError = RegistryError::UnknownTemplate("B_42.01".to_string()).into();
//! assert_eq!(err.exit_code(), 2);
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
