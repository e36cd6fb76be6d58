//! Closed code lists used by the register
//!
//! Each vocabulary pairs a code with the definition reported in B_99.01.

/// A named list of codes with their definitions
#[derive(Debug)]
pub struct Vocabulary {
    pub name: &'static str,
    pub entries: &'static [(&'static str, &'static str)],
}

impl Vocabulary {
    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| *c == code)
    }

    pub fn definition(&self, code: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, definition)| *definition)
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|(c, _)| *c)
    }
}

pub const ENTITY_TYPE: Vocabulary = Vocabulary {
    name: "entity_type",
    entries: &[
        ("credit_institution", "Credit institution"),
        ("investment_firm", "Investment firm"),
        ("payment_institution", "Payment institution"),
        ("e_money_institution", "Electronic money institution"),
        ("insurance_undertaking", "Insurance undertaking"),
        ("reinsurance_undertaking", "Reinsurance undertaking"),
        ("crypto_asset_service_provider", "Crypto-asset service provider"),
        ("central_counterparty", "Central counterparty"),
        ("trading_venue", "Trading venue"),
        ("other", "Other financial entity"),
    ],
};

pub const PROVIDER_ID_TYPE: Vocabulary = Vocabulary {
    name: "provider_id_type",
    entries: &[
        ("lei", "Legal Entity Identifier"),
        ("euid", "European Unique Identifier"),
        ("vat", "VAT registration number"),
        ("other", "Other national identifier"),
    ],
};

pub const PERSON_TYPE: Vocabulary = Vocabulary {
    name: "person_type",
    entries: &[("legal", "Legal person"), ("natural", "Natural person")],
};

pub const PROVIDER_TYPE: Vocabulary = Vocabulary {
    name: "provider_type",
    entries: &[
        ("cloud_service_provider", "Cloud service provider"),
        ("software_vendor", "Software vendor"),
        ("data_centre", "Data centre operator"),
        ("network_provider", "Telecommunication or network provider"),
        ("managed_service_provider", "Managed ICT service provider"),
        ("consulting", "ICT consulting firm"),
        ("other", "Other ICT third-party service provider"),
    ],
};

pub const CONTRACT_TYPE: Vocabulary = Vocabulary {
    name: "contract_type",
    entries: &[
        ("standalone", "Standalone arrangement"),
        ("overarching", "Overarching arrangement"),
        ("subsequent", "Subsequent or associated arrangement"),
    ],
};

pub const TERMINATION_REASON: Vocabulary = Vocabulary {
    name: "termination_reason",
    entries: &[
        ("expiry", "Termination on expiry of the arrangement"),
        ("breach", "Termination due to breach by the provider"),
        ("convenience", "Termination for convenience"),
        ("regulatory", "Termination required by the competent authority"),
        ("other", "Other reason"),
    ],
};

pub const SERVICE_TYPE: Vocabulary = Vocabulary {
    name: "ict_service_type",
    entries: &[
        ("S01", "ICT project management"),
        ("S02", "ICT development"),
        ("S03", "ICT help desk and first level support"),
        ("S04", "ICT security management services"),
        ("S05", "Provision of data"),
        ("S06", "Data analysis"),
        ("S07", "ICT, facilities and hosting services (excluding cloud services)"),
        ("S08", "Computation"),
        ("S09", "Non-cloud data storage"),
        ("S10", "Telecom carrier"),
        ("S11", "Network infrastructure"),
        ("S12", "Hardware and physical devices"),
        ("S13", "Software licencing (excluding SaaS)"),
        ("S14", "ICT operation management (including maintenance)"),
        ("S15", "ICT consulting"),
        ("S16", "ICT risk management"),
        ("S17", "Cloud services: IaaS"),
        ("S18", "Cloud services: PaaS"),
        ("S19", "Cloud services: SaaS"),
    ],
};

pub const CRITICALITY: Vocabulary = Vocabulary {
    name: "criticality",
    entries: &[
        ("critical", "Supports a critical or important function"),
        ("important", "Important but not supporting a critical function"),
        ("non_critical", "Not critical"),
    ],
};

pub const SENSITIVITY: Vocabulary = Vocabulary {
    name: "data_sensitivity",
    entries: &[
        ("low", "Low sensitiveness of data"),
        ("medium", "Medium sensitiveness of data"),
        ("high", "High sensitiveness of data"),
    ],
};

pub const LOCATION_TYPE: Vocabulary = Vocabulary {
    name: "location_type",
    entries: &[
        ("processing", "Data processing location"),
        ("storage", "Data storage location"),
        ("backup", "Backup location"),
        ("disaster_recovery", "Disaster recovery location"),
    ],
};

pub const FRAMEWORK: Vocabulary = Vocabulary {
    name: "assessment_framework",
    entries: &[
        ("dora", "Internal DORA criticality assessment"),
        ("soc2", "SOC 2 assurance report"),
        ("iso27001", "ISO/IEC 27001 certification"),
    ],
};

pub const IMPACT: Vocabulary = Vocabulary {
    name: "discontinuation_impact",
    entries: &[
        ("low", "Low impact of discontinuing the function"),
        ("medium", "Medium impact of discontinuing the function"),
        ("high", "High impact of discontinuing the function"),
    ],
};

pub const SUBSTITUTABILITY: Vocabulary = Vocabulary {
    name: "substitutability",
    entries: &[
        ("not_substitutable", "Not substitutable"),
        ("highly_complex", "Highly complex substitutability"),
        ("medium_complexity", "Medium complexity in terms of substitutability"),
        ("easy", "Easily substitutable"),
    ],
};

/// Sensitivity rank used to pick the most sensitive data location
pub fn sensitivity_rank(code: &str) -> u8 {
    match code {
        "high" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_codes() {
        assert_eq!(SERVICE_TYPE.codes().count(), 19);
        assert!(SERVICE_TYPE.contains("S07"));
        assert!(!SERVICE_TYPE.contains("S20"));
        assert_eq!(SERVICE_TYPE.definition("S19"), Some("Cloud services: SaaS"));
    }

    #[test]
    fn test_sensitivity_rank() {
        assert!(sensitivity_rank("high") > sensitivity_rank("medium"));
        assert_eq!(sensitivity_rank("unknown"), 0);
    }
}
