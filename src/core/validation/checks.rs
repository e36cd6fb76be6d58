//! Field format predicates

use crate::core::registry::FieldFormat;
use crate::core::relation::Value;
use regex::Regex;
use std::sync::OnceLock;

fn lei_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{18}[0-9]{2}$").expect("valid LEI pattern"))
}

fn country_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("valid country pattern"))
}

fn currency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency pattern"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid e-mail pattern")
    })
}

fn euid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}[A-Z0-9.]{3,60}$").expect("valid EUID pattern"))
}

fn vat_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{2,13}$").expect("valid VAT pattern"))
}

pub fn is_lei(value: &str) -> bool {
    lei_regex().is_match(value)
}

pub fn is_country(value: &str) -> bool {
    country_regex().is_match(value)
}

pub fn is_currency(value: &str) -> bool {
    currency_regex().is_match(value)
}

pub fn is_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Whether a provider identifier has the shape its identifier type requires.
/// Unknown identifier types are left to the vocabulary check.
pub fn provider_id_matches(id_type: &str, id: &str) -> bool {
    match id_type {
        "lei" => is_lei(id),
        "euid" => euid_regex().is_match(id),
        "vat" => vat_regex().is_match(id),
        _ => !id.trim().is_empty(),
    }
}

/// Items of a value that violate `format`. Empty values never violate a
/// format; presence is the concern of the required rules.
pub fn format_violations<'a>(format: &FieldFormat, value: &'a Value) -> Vec<&'a str> {
    let items: Vec<&str> = match value {
        Value::Text(s) if !s.trim().is_empty() => vec![s.as_str()],
        Value::List(items) => items.iter().map(String::as_str).collect(),
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter(|item| !conforms(format, item))
        .collect()
}

fn conforms(format: &FieldFormat, value: &str) -> bool {
    match format {
        FieldFormat::Lei => is_lei(value),
        FieldFormat::Country => is_country(value),
        FieldFormat::Currency => is_currency(value),
        FieldFormat::Email => is_email(value),
        FieldFormat::Vocabulary(vocabulary) => vocabulary.contains(value),
        // compiled once by the engine; see Check::Pattern
        FieldFormat::Pattern(_) => true,
    }
}
