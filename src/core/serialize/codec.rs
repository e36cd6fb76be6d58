//! CSV codec for template relations
//!
//! UTF-8 without BOM, comma separated, CRLF terminated, quoted only when a
//! field needs it. The header record holds the column codes.

use crate::core::registry::{FieldSpec, FieldType};
use crate::core::relation::{Relation, Row, Value};
use crate::domain::{Result, RoiError, TemplateCode};
use chrono::NaiveDate;
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const LIST_SEPARATOR: char = ';';

/// Literal form of a value for a field of type `ty`
pub fn render_value(value: &Value, ty: FieldType) -> String {
    match value {
        Value::Null => String::new(),
        Value::Text(s) => s.clone(),
        Value::Integer(i) => match ty {
            FieldType::Decimal { scale } => render_decimal(Decimal::from(*i), scale),
            _ => i.to_string(),
        },
        Value::Decimal(d) => match ty {
            FieldType::Decimal { scale } => render_decimal(*d, scale),
            _ => d.normalize().to_string(),
        },
        Value::Boolean(b) => b.to_string(),
        Value::Date(d) => d.format(DATE_FORMAT).to_string(),
        Value::List(items) => items.join(&LIST_SEPARATOR.to_string()),
    }
}

fn render_decimal(value: Decimal, scale: u32) -> String {
    let mut fixed = value.round_dp(scale);
    fixed.rescale(scale);
    fixed.to_string()
}

/// Whether `item` survives being joined into a list cell and split again
pub fn is_list_item(item: &str) -> bool {
    !item.is_empty() && !item.contains(LIST_SEPARATOR)
}

/// Writes a relation as CSV bytes
///
/// # Errors
///
/// Fails on a list item that is empty or holds the `;` separator.
pub fn write_relation(relation: &Relation, fields: &[FieldSpec]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(relation.columns())?;
    for (index, row) in relation.raw_rows().iter().enumerate() {
        let mut record = Vec::with_capacity(row.len());
        for (value, field) in row.iter().zip(fields) {
            if let Some(item) = value
                .as_list()
                .and_then(|items| items.iter().find(|item| !is_list_item(item)))
            {
                return Err(RoiError::Serialization(format!(
                    "{} row {index} {}: list item '{item}' is empty or contains '{LIST_SEPARATOR}'",
                    relation.code(),
                    field.code
                )));
            }
            record.push(render_value(value, field.ty));
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| RoiError::Serialization(format!("Failed to flush {}: {e}", relation.code())))
}

/// Reads rendered CSV back into a typed relation
///
/// # Errors
///
/// Fails when the header does not list the schema columns in order, or when
/// a cell cannot be read as the type of its field.
pub fn parse_relation(code: TemplateCode, fields: &[FieldSpec], bytes: &[u8]) -> Result<Relation> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let expected: Vec<&str> = fields.iter().map(|f| f.code).collect();
    if header != expected {
        return Err(RoiError::Serialization(format!(
            "{code}: header {header:?} does not match columns {expected:?}"
        )));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .zip(fields)
            .map(|(cell, field)| {
                parse_value(cell, field.ty).map_err(|reason| {
                    RoiError::Serialization(format!(
                        "{code} row {index} {}: {reason}",
                        field.code
                    ))
                })
            })
            .collect::<Result<Row>>()?;
        rows.push(row);
    }

    Relation::new(code, expected, rows)
}

/// Parses one cell; an empty cell is `Null`
pub fn parse_value(cell: &str, ty: FieldType) -> std::result::Result<Value, String> {
    if cell.is_empty() {
        return Ok(Value::Null);
    }
    match ty {
        FieldType::Text => Ok(Value::text(cell)),
        FieldType::Integer => cell
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| format!("'{cell}' is not an integer: {e}")),
        FieldType::Decimal { .. } => Decimal::from_str(cell)
            .map(Value::Decimal)
            .map_err(|e| format!("'{cell}' is not a decimal: {e}")),
        FieldType::Boolean => match cell {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            other => Err(format!("'{other}' is not a boolean")),
        },
        FieldType::Date => NaiveDate::parse_from_str(cell, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|e| format!("'{cell}' is not a date: {e}")),
        FieldType::List => Ok(Value::List(
            cell.split(LIST_SEPARATOR).map(str::to_string).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{FieldSpec, TemplateRegistry};
    use crate::core::registry::templates::fixtures;
    use test_case::test_case;

    const CODE: TemplateCode = TemplateCode::new("X_01.01");

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::mandatory("c0010", "Name", FieldType::Text),
            FieldSpec::optional("c0020", "Amount", FieldType::Decimal { scale: 2 }),
            FieldSpec::optional("c0030", "Flag", FieldType::Boolean),
            FieldSpec::optional("c0040", "Date", FieldType::Date),
            FieldSpec::optional("c0050", "Codes", FieldType::List),
        ]
    }

    #[test_case(Value::Null, FieldType::Text, "" ; "null is empty")]
    #[test_case(Value::Boolean(true), FieldType::Boolean, "true" ; "boolean")]
    #[test_case(Value::Decimal(Decimal::new(455005, 1)), FieldType::Decimal { scale: 2 }, "45500.50" ; "decimal padded")]
    #[test_case(Value::Decimal(Decimal::new(12345, 3)), FieldType::Decimal { scale: 2 }, "12.34" ; "decimal rounded")]
    #[test_case(Value::Integer(120), FieldType::Decimal { scale: 2 }, "120.00" ; "integer as decimal")]
    #[test_case(Value::Date(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()), FieldType::Date, "2025-01-09" ; "date")]
    #[test_case(Value::List(vec!["S01".into(), "S02".into()]), FieldType::List, "S01;S02" ; "list")]
    fn test_render_value(value: Value, ty: FieldType, expected: &str) {
        assert_eq!(render_value(&value, ty), expected);
    }

    #[test]
    fn test_crlf_and_quoting() {
        let relation = Relation::new(
            CODE,
            fields().iter().map(|f| f.code).collect(),
            vec![vec![
                Value::text("Acme, \"the\" bank"),
                Value::Decimal(Decimal::new(100, 0)),
                Value::Boolean(false),
                Value::Null,
                Value::Null,
            ]],
        )
        .unwrap();

        let bytes = write_relation(&relation, &fields()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "c0010,c0020,c0030,c0040,c0050\r\n\"Acme, \"\"the\"\" bank\",100.00,false,,\r\n"
        );
    }

    #[test]
    fn test_header_mismatch_is_rejected() {
        let err = parse_relation(CODE, &fields(), b"c0010,c0099\r\nx,y\r\n").unwrap_err();
        assert!(matches!(err, RoiError::Serialization(_)));
    }

    #[test]
    fn test_bad_cell_is_rejected() {
        let input = b"c0010,c0020,c0030,c0040,c0050\r\nx,1.00,maybe,,\r\n";
        let err = parse_relation(CODE, &fields(), input).unwrap_err();
        assert!(err.to_string().contains("c0030"));
    }

    #[test]
    fn test_standard_templates_read_back() {
        let registry = TemplateRegistry::standard().unwrap();
        let relations = fixtures::build_all(&fixtures::snapshot());

        for (code, relation) in relations.iter() {
            let fields = registry.descriptor(*code).unwrap().fields;
            let bytes = write_relation(relation, fields).unwrap();
            let parsed = parse_relation(*code, fields, &bytes).unwrap();
            assert_eq!(&parsed, &**relation, "{code} did not read back identically");
        }
    }

    #[test]
    fn test_empty_list_reads_back() {
        let relation = Relation::new(
            CODE,
            fields().iter().map(|f| f.code).collect(),
            vec![vec![
                Value::text("S-1"),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::List(vec![]),
            ]],
        )
        .unwrap();

        let bytes = write_relation(&relation, &fields()).unwrap();
        assert_eq!(parse_relation(CODE, &fields(), &bytes).unwrap(), relation);
    }

    #[test_case("a;b" ; "separator inside item")]
    #[test_case("" ; "empty item")]
    fn test_unsplittable_list_item_is_rejected(item: &str) {
        let relation = Relation::new(
            CODE,
            fields().iter().map(|f| f.code).collect(),
            vec![vec![
                Value::text("S-1"),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::List(vec!["ok".into(), item.into()]),
            ]],
        )
        .unwrap();

        let err = write_relation(&relation, &fields()).unwrap_err();
        assert!(matches!(err, RoiError::Serialization(_)));
        assert!(err.to_string().contains("c0050"));
    }
}
