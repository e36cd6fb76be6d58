//! CLI command implementations

pub mod compile;
pub mod init;
pub mod plan;
pub mod validate;
pub mod verify;
