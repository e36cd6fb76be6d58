//! Verification of written export packages
//!
//! Checks a package directory against its manifest, and compares two
//! manifests when a register is resubmitted.

pub mod checksum;
pub mod report;
pub mod verify;

pub use report::{FileChange, FileCheck, FileOutcome, ManifestDiff, VerificationReport};
pub use verify::{diff_manifests, verify_package};
