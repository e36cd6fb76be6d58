//! Field schema of a template

use crate::core::registry::vocabulary::Vocabulary;

/// Type of a field value and its literal form in the export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    /// Fixed-scale decimal, rendered with exactly `scale` fractional digits
    Decimal { scale: u32 },
    Boolean,
    Date,
    /// List of codes, rendered joined by `;`
    List,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal { .. } => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::List => "list",
        }
    }
}

/// Whether a field must be filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Missing value is an error
    Mandatory,
    /// Missing value is a warning
    Recommended,
    Optional,
}

/// Structural constraint on a field value
#[derive(Debug, Clone, Copy)]
pub enum FieldFormat {
    /// ISO 17442 Legal Entity Identifier: 20 uppercase alphanumerics
    Lei,
    /// ISO 3166-1 alpha-2
    Country,
    /// ISO 4217
    Currency,
    Email,
    /// Whole-value regular expression, e.g. a reference code shape
    Pattern(&'static str),
    /// Value (or every list item) must be a code of the vocabulary
    Vocabulary(&'static Vocabulary),
}

impl FieldFormat {
    pub fn describe(&self) -> String {
        match self {
            FieldFormat::Lei => "20-character alphanumeric LEI".to_string(),
            FieldFormat::Country => "ISO 3166-1 alpha-2 country code".to_string(),
            FieldFormat::Currency => "ISO 4217 currency code".to_string(),
            FieldFormat::Email => "e-mail address".to_string(),
            FieldFormat::Pattern(p) => format!("value matching {p}"),
            FieldFormat::Vocabulary(v) => format!("code of the {} vocabulary", v.name),
        }
    }
}

/// One column of a template
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Column code, e.g. `c0010`
    pub code: &'static str,
    pub name: &'static str,
    pub ty: FieldType,
    pub presence: Presence,
    pub format: Option<FieldFormat>,
}

impl FieldSpec {
    pub const fn mandatory(code: &'static str, name: &'static str, ty: FieldType) -> Self {
        Self::new(code, name, ty, Presence::Mandatory)
    }

    pub const fn recommended(code: &'static str, name: &'static str, ty: FieldType) -> Self {
        Self::new(code, name, ty, Presence::Recommended)
    }

    pub const fn optional(code: &'static str, name: &'static str, ty: FieldType) -> Self {
        Self::new(code, name, ty, Presence::Optional)
    }

    const fn new(code: &'static str, name: &'static str, ty: FieldType, presence: Presence) -> Self {
        Self {
            code,
            name,
            ty,
            presence,
            format: None,
        }
    }

    pub const fn with_format(self, format: FieldFormat) -> Self {
        Self {
            format: Some(format),
            ..self
        }
    }

    /// Scale of a decimal field
    pub fn scale(&self) -> Option<u32> {
        match self.ty {
            FieldType::Decimal { scale } => Some(scale),
            _ => None,
        }
    }
}
