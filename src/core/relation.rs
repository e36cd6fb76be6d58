//! Materialized template relations
//!
//! A relation is the ordered list of typed rows of one template. Rows are
//! positional: value `i` belongs to field `i` of the template schema.

use crate::domain::{RoiError, Result, TemplateCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A typed field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    List(Vec<String>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Text value, or `Null` when absent
    pub fn opt_text(value: Option<impl Into<String>>) -> Self {
        value.map_or(Value::Null, |v| Value::Text(v.into()))
    }

    pub fn opt_integer(value: Option<i64>) -> Self {
        value.map_or(Value::Null, Value::Integer)
    }

    pub fn opt_decimal(value: Option<Decimal>) -> Self {
        value.map_or(Value::Null, Value::Decimal)
    }

    pub fn opt_date(value: Option<NaiveDate>) -> Self {
        value.map_or(Value::Null, Value::Date)
    }

    pub fn opt_boolean(value: Option<bool>) -> Self {
        value.map_or(Value::Null, Value::Boolean)
    }

    /// Null, blank text and empty lists count as empty
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    fn has_empty_literal(&self) -> bool {
        match self {
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

pub type Row = Vec<Value>;

static NULL: Value = Value::Null;

/// The rows of one template together with its column codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    code: TemplateCode,
    columns: Vec<&'static str>,
    rows: Vec<Row>,
}

impl Relation {
    /// Creates a relation, rejecting rows whose width differs from the schema
    ///
    /// Empty text and empty lists are stored as `Null`, the value their
    /// empty literal reads back as.
    pub fn new(code: TemplateCode, columns: Vec<&'static str>, mut rows: Vec<Row>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(RoiError::Configuration(format!(
                "Template {code} produced row {index} with {} values, schema has {} fields",
                row.len(),
                columns.len()
            )));
        }
        for value in rows.iter_mut().flatten() {
            if value.has_empty_literal() {
                *value = Value::Null;
            }
        }
        Ok(Self {
            code,
            columns,
            rows,
        })
    }

    pub fn code(&self) -> TemplateCode {
        self.code
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn raw_rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == field)
    }

    pub fn row(&self, index: usize) -> RowRef<'_> {
        RowRef {
            relation: self,
            index,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).map(move |index| self.row(index))
    }

    /// Distinct non-empty text values of a column
    pub fn key_set(&self, field: &str) -> BTreeSet<&str> {
        self.rows()
            .filter_map(|row| row.text(field))
            .filter(|v| !v.trim().is_empty())
            .collect()
    }
}

/// Borrowed view of one row, with access by field code
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    relation: &'a Relation,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a field; unknown fields read as `Null`
    pub fn get(&self, field: &str) -> &'a Value {
        match self.relation.column_index(field) {
            Some(col) => &self.relation.rows[self.index][col],
            None => &NULL,
        }
    }

    pub fn text(&self, field: &str) -> Option<&'a str> {
        self.get(field).as_text()
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).as_integer()
    }

    pub fn decimal(&self, field: &str) -> Option<Decimal> {
        self.get(field).as_decimal()
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.get(field).as_boolean()
    }

    pub fn date(&self, field: &str) -> Option<NaiveDate> {
        self.get(field).as_date()
    }
}

/// Materialized relations keyed by template code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSet {
    relations: BTreeMap<TemplateCode, Arc<Relation>>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: Relation) {
        self.relations.insert(relation.code(), Arc::new(relation));
    }

    pub fn insert_shared(&mut self, relation: Arc<Relation>) {
        self.relations.insert(relation.code(), relation);
    }

    pub fn get(&self, code: TemplateCode) -> Option<&Relation> {
        self.relations.get(&code).map(|r| r.as_ref())
    }

    pub fn get_shared(&self, code: TemplateCode) -> Option<Arc<Relation>> {
        self.relations.get(&code).cloned()
    }

    pub fn contains(&self, code: TemplateCode) -> bool {
        self.relations.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = TemplateCode> + '_ {
        self.relations.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TemplateCode, &Arc<Relation>)> {
        self.relations.iter()
    }

    pub fn total_rows(&self) -> usize {
        self.relations.values().map(|r| r.len()).sum()
    }
}
