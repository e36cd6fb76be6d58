//! Package verification
//!
//! Re-hashes the files of a written package against its manifest, and
//! compares two manifests to find what a resubmission changes.

use crate::core::serialize::{Manifest, MANIFEST_FILE};
use crate::core::verification::checksum::sha256_hex;
use crate::core::verification::report::{
    FileChange, FileCheck, FileOutcome, ManifestDiff, VerificationReport,
};
use crate::domain::context::ResultExt;
use crate::domain::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Verifies every file listed in the manifest of `dir`
pub async fn verify_package(dir: &Path) -> Result<VerificationReport> {
    let manifest = Manifest::read(dir).await?;
    let mut report = VerificationReport::new(
        manifest.entity_id.clone(),
        manifest.reporting_date,
        manifest.status,
    );

    tracing::info!(
        dir = %dir.display(),
        files = manifest.files.len(),
        "Starting package verification"
    );

    for entry in &manifest.files {
        let outcome = match tokio::fs::read(dir.join(&entry.name)).await {
            Ok(content) => {
                let actual = sha256_hex(&content);
                if actual == entry.sha256 {
                    FileOutcome::Intact
                } else {
                    tracing::warn!(file = %entry.name, "Checksum mismatch");
                    FileOutcome::Altered { actual }
                }
            }
            Err(e) => FileOutcome::Unreadable {
                reason: format!("Cannot read file: {e}"),
            },
        };
        report.checks.push(FileCheck {
            file: entry.name.clone(),
            template: entry.template,
            expected: entry.sha256.clone(),
            outcome,
        });
    }

    let listed: BTreeSet<&str> = manifest.files.iter().map(|f| f.name.as_str()).collect();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != MANIFEST_FILE && !listed.contains(name.as_str()) {
            report.unlisted.push(name);
        }
    }
    report.unlisted.sort();

    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        unlisted = report.unlisted.len(),
        "Verification completed"
    );
    Ok(report)
}

/// Compares a previous manifest with a new one by file checksum
pub fn diff_manifests(previous: &Manifest, current: &Manifest) -> ManifestDiff {
    let old: BTreeMap<&str, &str> = previous
        .files
        .iter()
        .map(|f| (f.name.as_str(), f.sha256.as_str()))
        .collect();
    let new: BTreeMap<&str, &str> = current
        .files
        .iter()
        .map(|f| (f.name.as_str(), f.sha256.as_str()))
        .collect();

    let names: BTreeSet<&str> = old.keys().chain(new.keys()).copied().collect();
    let files = names
        .into_iter()
        .map(|name| {
            let change = match (old.get(name), new.get(name)) {
                (Some(a), Some(b)) if a == b => FileChange::Unchanged,
                (Some(_), Some(_)) => FileChange::Changed,
                (None, Some(_)) => FileChange::Added,
                _ => FileChange::Removed,
            };
            (name.to_string(), change)
        })
        .collect();

    ManifestDiff { files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::serialize::{ManifestEntry, PackageStatus};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn entry(name: &str, content: &[u8]) -> ManifestEntry {
        ManifestEntry {
            name: name.to_string(),
            template: None,
            rows: 1,
            sha256: sha256_hex(content),
        }
    }

    fn manifest(files: Vec<ManifestEntry>) -> Manifest {
        Manifest {
            entity_id: "529900T8BM49AURSDO55".to_string(),
            reporting_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            status: PackageStatus::Final,
            template_count: files.len(),
            total_rows: files.len(),
            files,
        }
    }

    #[tokio::test]
    async fn test_verify_detects_tampering() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.csv"), b"one").unwrap();
        std::fs::write(dir.path().join("b.csv"), b"two").unwrap();
        std::fs::write(dir.path().join("extra.txt"), b"?").unwrap();
        let manifest = manifest(vec![
            entry("a.csv", b"one"),
            entry("b.csv", b"TWO"),
            entry("c.csv", b"three"),
        ]);
        std::fs::write(dir.path().join(MANIFEST_FILE), manifest.to_bytes().unwrap()).unwrap();

        let report = verify_package(dir.path()).await.unwrap();
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 2);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures[0].file, "b.csv");
        assert!(matches!(failures[1].outcome, FileOutcome::Unreadable { .. }));
        assert_eq!(report.unlisted, vec!["extra.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(verify_package(dir.path()).await.is_err());
    }

    #[test]
    fn test_diff_manifests() {
        let previous = manifest(vec![
            entry("a.csv", b"one"),
            entry("b.csv", b"two"),
            entry("c.csv", b"three"),
        ]);
        let current = manifest(vec![
            entry("a.csv", b"one"),
            entry("b.csv", b"2"),
            entry("d.csv", b"four"),
        ]);

        let diff = diff_manifests(&previous, &current);
        assert_eq!(
            diff.files,
            vec![
                ("a.csv".to_string(), FileChange::Unchanged),
                ("b.csv".to_string(), FileChange::Changed),
                ("c.csv".to_string(), FileChange::Removed),
                ("d.csv".to_string(), FileChange::Added),
            ]
        );
        assert!(diff_manifests(&previous, &previous).is_identical());
    }
}
