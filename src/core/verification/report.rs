//! Verification and resubmission reports

use crate::core::serialize::PackageStatus;
use crate::domain::TemplateCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What re-hashing a listed file found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum FileOutcome {
    Intact,
    /// Content hashes to something else than the manifest says
    Altered { actual: String },
    /// Missing or unreadable
    Unreadable { reason: String },
}

/// One manifest entry checked against the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCheck {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateCode>,
    pub expected: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileCheck {
    pub fn is_intact(&self) -> bool {
        self.outcome == FileOutcome::Intact
    }

    fn describe(&self) -> String {
        match &self.outcome {
            FileOutcome::Intact => "intact".to_string(),
            FileOutcome::Altered { actual } => {
                format!("sha256 {actual}, manifest lists {}", self.expected)
            }
            FileOutcome::Unreadable { reason } => reason.clone(),
        }
    }
}

/// Result of re-hashing a written package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub entity_id: String,
    pub reporting_date: NaiveDate,
    pub status: PackageStatus,

    /// Manifest entries in manifest order
    pub checks: Vec<FileCheck>,

    /// Files present in the directory but absent from the manifest
    pub unlisted: Vec<String>,
}

impl VerificationReport {
    pub fn new(entity_id: String, reporting_date: NaiveDate, status: PackageStatus) -> Self {
        Self {
            entity_id,
            reporting_date,
            status,
            checks: Vec::new(),
            unlisted: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.is_intact()).count()
    }

    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileCheck> {
        self.checks.iter().filter(|c| !c.is_intact())
    }

    /// Every listed file matched its checksum. Unlisted files do not fail
    /// verification; they are reported separately.
    pub fn is_success(&self) -> bool {
        self.checks.iter().all(FileCheck::is_intact)
    }

    pub fn format_summary(&self) -> String {
        let verdict = if self.is_success() { "INTACT" } else { "ALTERED" };
        let mut summary = format!(
            "Package {} {} ({}): {verdict}\n",
            self.entity_id,
            self.reporting_date,
            self.status.as_str()
        );
        summary.push_str(&format!(
            "  {} of {} listed files match the manifest\n",
            self.passed(),
            self.checks.len()
        ));

        for check in self.failures() {
            let label = check
                .template
                .map_or_else(|| check.file.clone(), |t| format!("{} [{t}]", check.file));
            summary.push_str(&format!("  ! {label}: {}\n", check.describe()));
        }
        for name in &self.unlisted {
            summary.push_str(&format!("  ? {name}: not listed in the manifest\n"));
        }

        summary
    }
}

/// Change of one file between two manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChange {
    Unchanged,
    Changed,
    Added,
    Removed,
}

/// File-by-file comparison of a package with a previous submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDiff {
    /// Files in name order with their change
    pub files: Vec<(String, FileChange)>,
}

impl ManifestDiff {
    pub fn count(&self, change: FileChange) -> usize {
        self.files.iter().filter(|(_, c)| *c == change).count()
    }

    /// Nothing to resubmit
    pub fn is_identical(&self) -> bool {
        self.files.iter().all(|(_, c)| *c == FileChange::Unchanged)
    }

    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Changes against the previous submission\n");
        summary.push_str(&format!("  Unchanged: {}\n", self.count(FileChange::Unchanged)));
        summary.push_str(&format!("  Changed: {}\n", self.count(FileChange::Changed)));
        summary.push_str(&format!("  Added: {}\n", self.count(FileChange::Added)));
        summary.push_str(&format!("  Removed: {}\n", self.count(FileChange::Removed)));
        for (name, change) in &self.files {
            let marker = match change {
                FileChange::Unchanged => continue,
                FileChange::Changed => "~",
                FileChange::Added => "+",
                FileChange::Removed => "-",
            };
            summary.push_str(&format!("  {marker} {name}\n"));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> VerificationReport {
        VerificationReport::new(
            "529900T8BM49AURSDO55".to_string(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            PackageStatus::Final,
        )
    }

    fn check(file: &str, outcome: FileOutcome) -> FileCheck {
        FileCheck {
            file: file.to_string(),
            template: None,
            expected: "abc".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_counts_follow_outcomes() {
        let mut report = report();
        report.checks.push(check("B_01.01.csv", FileOutcome::Intact));
        assert!(report.is_success());

        report.checks.push(FileCheck {
            template: Some(TemplateCode::B_02_01),
            ..check(
                "B_02.01.csv",
                FileOutcome::Altered {
                    actual: "def".to_string(),
                },
            )
        });
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.failures().next().unwrap().file, "B_02.01.csv");
    }

    #[test]
    fn test_unlisted_files_do_not_fail() {
        let mut report = report();
        report.checks.push(check("B_01.01.csv", FileOutcome::Intact));
        report.unlisted.push("notes.txt".to_string());
        assert!(report.is_success());

        let summary = report.format_summary();
        assert!(summary.contains(": INTACT"));
        assert!(summary.contains("1 of 1 listed files"));
        assert!(summary.contains("? notes.txt"));
    }

    #[test]
    fn test_summary_names_altered_template() {
        let mut report = report();
        report.checks.push(FileCheck {
            template: Some(TemplateCode::B_05_01),
            ..check(
                "B_05.01.csv",
                FileOutcome::Altered {
                    actual: "def".to_string(),
                },
            )
        });
        report.checks.push(check(
            "parameters.csv",
            FileOutcome::Unreadable {
                reason: "No such file".to_string(),
            },
        ));

        let summary = report.format_summary();
        assert!(summary.contains(": ALTERED"));
        assert!(summary.contains("! B_05.01.csv [B_05.01]: sha256 def, manifest lists abc"));
        assert!(summary.contains("! parameters.csv: No such file"));
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let json = serde_json::to_value(check(
            "B_01.01.csv",
            FileOutcome::Altered {
                actual: "def".to_string(),
            },
        ))
        .unwrap();
        assert_eq!(json["outcome"], "altered");
        assert_eq!(json["actual"], "def");
        assert!(json.get("template").is_none());
    }

    #[test]
    fn test_diff_summary_skips_unchanged() {
        let diff = ManifestDiff {
            files: vec![
                ("B_01.01.csv".to_string(), FileChange::Unchanged),
                ("B_02.01.csv".to_string(), FileChange::Changed),
            ],
        };
        assert!(!diff.is_identical());
        let summary = diff.format_summary();
        assert!(summary.contains("~ B_02.01.csv"));
        assert!(!summary.contains("B_01.01.csv"));
    }
}
