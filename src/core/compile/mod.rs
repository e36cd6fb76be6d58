//! Compilation orchestration
//!
//! - [`compiler`] - The register compiler and its result
//! - [`options`] - Run context and options
//! - [`state`] - Compilation state machine
//! - [`summary`] - Run summary

pub mod compiler;
pub mod options;
pub mod state;
pub mod summary;

pub use compiler::{CompileResult, RegisterCompiler};
pub use options::{CompileContext, CompileOptions, OnBlocked, TemplateSelection};
pub use state::{CompileState, StateMachine};
pub use summary::CompileSummary;
