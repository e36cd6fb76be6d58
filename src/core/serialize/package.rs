//! Export package and manifest

use crate::domain::{Result, RoiError, TemplateCode};
use crate::domain::context::ResultExt;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the manifest inside a package
pub const MANIFEST_FILE: &str = "manifest.json";

/// Whether a package may be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    /// Validated without errors
    Final,
    /// Written despite blocking findings, for review only
    Draft,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Final => "final",
            PackageStatus::Draft => "draft",
        }
    }
}

/// One file listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    /// Template rendered in the file, absent for package metadata files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateCode>,
    pub rows: usize,
    pub sha256: String,
}

/// Package manifest
///
/// Holds no timestamps so identical inputs give byte-identical manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub entity_id: String,
    pub reporting_date: NaiveDate,
    pub status: PackageStatus,
    /// Number of template files
    pub template_count: usize,
    /// Data rows over all template files
    pub total_rows: usize,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Pretty JSON with a trailing newline
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Reads `manifest.json` from a package directory, or a manifest file
    pub async fn read(path: &Path) -> Result<Self> {
        let file = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        let bytes = tokio::fs::read(&file)
            .await
            .with_context(|| format!("Failed to read manifest {}", file.display()))?;
        Self::from_bytes(&bytes)
    }
}

/// One rendered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub name: String,
    pub template: Option<TemplateCode>,
    pub rows: usize,
    pub content: Vec<u8>,
}

/// Rendered files in package order, plus their manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPackage {
    pub manifest: Manifest,
    pub files: Vec<PackageFile>,
}

impl ExportPackage {
    pub fn file(&self, name: &str) -> Option<&PackageFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn status(&self) -> PackageStatus {
        self.manifest.status
    }

    /// Writes every file and then the manifest into `dir`
    ///
    /// # Errors
    ///
    /// Refuses to replace an existing package unless `overwrite` is set.
    pub async fn write_to_dir(&self, dir: &Path, overwrite: bool) -> Result<PathBuf> {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !overwrite && tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
            return Err(RoiError::Io(format!(
                "A package already exists in {} (enable overwrite to replace it)",
                dir.display()
            )));
        }

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        for file in &self.files {
            let path = dir.join(&file.name);
            tokio::fs::write(&path, &file.content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        tokio::fs::write(&manifest_path, self.manifest.to_bytes()?)
            .await
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        tracing::info!(
            dir = %dir.display(),
            files = self.files.len(),
            status = self.manifest.status.as_str(),
            "Export package written"
        );
        Ok(manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package() -> ExportPackage {
        let content = b"c0010\r\nx\r\n".to_vec();
        ExportPackage {
            manifest: Manifest {
                entity_id: "529900T8BM49AURSDO55".to_string(),
                reporting_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                status: PackageStatus::Final,
                template_count: 1,
                total_rows: 1,
                files: vec![ManifestEntry {
                    name: "B_01.01.csv".to_string(),
                    template: Some(TemplateCode::B_01_01),
                    rows: 1,
                    sha256: crate::core::verification::checksum::sha256_hex(&content),
                }],
            },
            files: vec![PackageFile {
                name: "B_01.01.csv".to_string(),
                template: Some(TemplateCode::B_01_01),
                rows: 1,
                content,
            }],
        }
    }

    #[test]
    fn test_manifest_has_no_timestamps() {
        let json = String::from_utf8(package().manifest.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"reporting_date\": \"2025-12-31\""));
        assert!(json.contains("\"status\": \"final\""));
        assert!(!json.contains("generated"));
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let package = package();

        package.write_to_dir(dir.path(), false).await.unwrap();
        let manifest = Manifest::read(dir.path()).await.unwrap();
        assert_eq!(manifest, package.manifest);

        let written = std::fs::read(dir.path().join("B_01.01.csv")).unwrap();
        assert_eq!(written, b"c0010\r\nx\r\n");
    }

    #[tokio::test]
    async fn test_existing_package_is_kept() {
        let dir = TempDir::new().unwrap();
        let package = package();

        package.write_to_dir(dir.path(), false).await.unwrap();
        assert!(package.write_to_dir(dir.path(), false).await.is_err());
        assert!(package.write_to_dir(dir.path(), true).await.is_ok());
    }
}
