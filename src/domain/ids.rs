//! Identifier newtypes
//!
//! Source record identifiers (LEIs, contract references, provider codes) stay
//! plain strings on the entities: a malformed identifier is register data that
//! must surface as a finding, not a parse failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Organization identifier
///
/// Scopes every record store query. The PostgreSQL store expects a UUID, the
/// snapshot and in-memory stores accept any non-empty key.
///
/// # Examples
///
/// ```
/// use dora_roi::domain::ids::OrganizationId;
/// use std::str::FromStr;
///
/// let org = OrganizationId::from_str("acme-bank").unwrap();
/// assert_eq!(org.as_str(), "acme-bank");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Creates a new OrganizationId, rejecting blank values
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Organization ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the organization ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrganizationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for OrganizationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Template code such as `B_02.01`
///
/// Codes are static: the fifteen standard codes are constants and custom
/// descriptors are declared with string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateCode(&'static str);

impl TemplateCode {
    pub const B_01_01: TemplateCode = TemplateCode("B_01.01");
    pub const B_01_02: TemplateCode = TemplateCode("B_01.02");
    pub const B_01_03: TemplateCode = TemplateCode("B_01.03");
    pub const B_02_01: TemplateCode = TemplateCode("B_02.01");
    pub const B_02_02: TemplateCode = TemplateCode("B_02.02");
    pub const B_02_03: TemplateCode = TemplateCode("B_02.03");
    pub const B_03_01: TemplateCode = TemplateCode("B_03.01");
    pub const B_03_02: TemplateCode = TemplateCode("B_03.02");
    pub const B_03_03: TemplateCode = TemplateCode("B_03.03");
    pub const B_04_01: TemplateCode = TemplateCode("B_04.01");
    pub const B_05_01: TemplateCode = TemplateCode("B_05.01");
    pub const B_05_02: TemplateCode = TemplateCode("B_05.02");
    pub const B_06_01: TemplateCode = TemplateCode("B_06.01");
    pub const B_07_01: TemplateCode = TemplateCode("B_07.01");
    pub const B_99_01: TemplateCode = TemplateCode("B_99.01");

    /// The fifteen standard templates, in code order
    pub const STANDARD: [TemplateCode; 15] = [
        Self::B_01_01,
        Self::B_01_02,
        Self::B_01_03,
        Self::B_02_01,
        Self::B_02_02,
        Self::B_02_03,
        Self::B_03_01,
        Self::B_03_02,
        Self::B_03_03,
        Self::B_04_01,
        Self::B_05_01,
        Self::B_05_02,
        Self::B_06_01,
        Self::B_07_01,
        Self::B_99_01,
    ];

    /// Declares a template code
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// File name of the template inside an export package
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.0)
    }
}

impl fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl FromStr for TemplateCode {
    type Err = String;

    /// Parses one of the standard codes. Both `B_02.01` and `b_02.01` are
    /// accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::STANDARD
            .iter()
            .find(|code| code.0.eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("Unknown template code: {s}"))
    }
}

impl Serialize for TemplateCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for TemplateCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
