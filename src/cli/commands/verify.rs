//! Verify command implementation
//!
//! Checks a written package against its manifest and, optionally, compares
//! it with the manifest of a previous submission.

use crate::core::serialize::Manifest;
use crate::core::verification::{diff_manifests, verify_package};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Package directory
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Manifest (or package directory) of the previous submission
    #[arg(long)]
    pub previous: Option<PathBuf>,
}

impl VerifyArgs {
    /// Execute the verify command
    ///
    /// Exit code 1 when a file fails its checksum.
    pub async fn execute(&self) -> anyhow::Result<i32> {
        println!("🔍 Verifying package: {}", self.dir.display());
        println!();

        let report = match verify_package(&self.dir).await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Verification failed: {e}");
                return Ok(e.exit_code());
            }
        };
        print!("{}", report.format_summary());

        if let Some(previous) = &self.previous {
            let (old, new) = match (
                Manifest::read(previous).await,
                Manifest::read(&self.dir).await,
            ) {
                (Ok(old), Ok(new)) => (old, new),
                (Err(e), _) | (_, Err(e)) => {
                    println!("❌ Cannot read manifest: {e}");
                    return Ok(e.exit_code());
                }
            };
            println!();
            print!("{}", diff_manifests(&old, &new).format_summary());
        }

        if report.is_success() {
            Ok(0)
        } else {
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_package_is_not_success() {
        let dir = TempDir::new().unwrap();
        let args = VerifyArgs {
            dir: dir.path().to_path_buf(),
            previous: None,
        };
        assert_ne!(args.execute().await.unwrap(), 0);
    }
}
