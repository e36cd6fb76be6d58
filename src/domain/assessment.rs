//! Criticality assessment payloads
//!
//! A critical function must carry a non-empty assessment. The payload is a
//! variant per assessment framework, discriminated by the `framework` tag when
//! stored as JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// SOC 2 report type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Soc2ReportType {
    Type1,
    Type2,
}

/// Auditor's opinion on a SOC 2 report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOpinion {
    Unqualified,
    Qualified,
    Adverse,
}

/// Assessment payload of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "framework", rename_all = "lowercase")]
pub enum Assessment {
    /// Internal DORA criticality assessment
    Dora {
        reasons: String,
        #[serde(default)]
        impact: Option<String>,
        #[serde(default)]
        assessed_on: Option<NaiveDate>,
    },
    /// Assurance taken from a provider's SOC 2 report
    Soc2 {
        report_type: Soc2ReportType,
        opinion: AuditOpinion,
        period_start: NaiveDate,
        period_end: NaiveDate,
        #[serde(default)]
        exceptions: u32,
    },
    /// Assurance taken from an ISO/IEC 27001 certificate
    Iso27001 {
        certificate_id: String,
        scope: String,
        #[serde(default)]
        issued_on: Option<NaiveDate>,
        #[serde(default)]
        valid_until: Option<NaiveDate>,
    },
}

impl Assessment {
    /// Vocabulary code of the framework
    pub fn framework(&self) -> &'static str {
        match self {
            Assessment::Dora { .. } => "dora",
            Assessment::Soc2 { .. } => "soc2",
            Assessment::Iso27001 { .. } => "iso27001",
        }
    }

    /// Narrative reported as the criticality reasons. `None` when the payload
    /// carries no usable narrative.
    pub fn summary(&self) -> Option<String> {
        match self {
            Assessment::Dora { reasons, .. } => {
                let reasons = reasons.trim();
                (!reasons.is_empty()).then(|| reasons.to_string())
            }
            Assessment::Soc2 {
                report_type,
                opinion,
                period_start,
                period_end,
                exceptions,
            } => {
                if period_end < period_start {
                    return None;
                }
                let kind = match report_type {
                    Soc2ReportType::Type1 => "Type I",
                    Soc2ReportType::Type2 => "Type II",
                };
                let opinion = match opinion {
                    AuditOpinion::Unqualified => "unqualified",
                    AuditOpinion::Qualified => "qualified",
                    AuditOpinion::Adverse => "adverse",
                };
                Some(format!(
                    "SOC 2 {kind} report, {opinion} opinion, period {period_start} to {period_end}, {exceptions} exception(s)"
                ))
            }
            Assessment::Iso27001 {
                certificate_id,
                scope,
                ..
            } => {
                let scope = scope.trim();
                if scope.is_empty() {
                    return None;
                }
                Some(format!("ISO/IEC 27001 certificate {certificate_id}: {scope}"))
            }
        }
    }

    /// Date of the last assessment
    pub fn assessed_on(&self) -> Option<NaiveDate> {
        match self {
            Assessment::Dora { assessed_on, .. } => *assessed_on,
            Assessment::Soc2 { period_end, .. } => Some(*period_end),
            Assessment::Iso27001 { issued_on, .. } => *issued_on,
        }
    }

    /// Impact of discontinuing the function, when assessed
    pub fn impact(&self) -> Option<&str> {
        match self {
            Assessment::Dora { impact, .. } => impact.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_dora_summary_blank_is_none() {
        let assessment = Assessment::Dora {
            reasons: "   ".to_string(),
            impact: None,
            assessed_on: None,
        };
        assert_eq!(assessment.summary(), None);
    }

    #[test]
    fn test_soc2_from_tagged_json() {
        let assessment: Assessment = serde_json::from_value(serde_json::json!({
            "framework": "soc2",
            "report_type": "type2",
            "opinion": "qualified",
            "period_start": "2024-01-01",
            "period_end": "2024-12-31",
            "exceptions": 2
        }))
        .unwrap();

        assert_eq!(assessment.framework(), "soc2");
        assert_eq!(assessment.assessed_on(), Some(date("2024-12-31")));
        let summary = assessment.summary().unwrap();
        assert!(summary.contains("Type II"));
        assert!(summary.contains("qualified"));
        assert!(summary.contains("2 exception(s)"));
    }

    #[test]
    fn test_soc2_inverted_period_is_empty() {
        let assessment = Assessment::Soc2 {
            report_type: Soc2ReportType::Type1,
            opinion: AuditOpinion::Unqualified,
            period_start: date("2024-12-31"),
            period_end: date("2024-01-01"),
            exceptions: 0,
        };
        assert_eq!(assessment.summary(), None);
    }

    #[test]
    fn test_iso27001_summary() {
        let assessment = Assessment::Iso27001 {
            certificate_id: "ISMS-042".to_string(),
            scope: "Payments platform".to_string(),
            issued_on: Some(date("2023-06-01")),
            valid_until: None,
        };
        assert_eq!(assessment.framework(), "iso27001");
        assert_eq!(
            assessment.summary().as_deref(),
            Some("ISO/IEC 27001 certificate ISMS-042: Payments platform")
        );
        assert_eq!(assessment.impact(), None);
    }
}
