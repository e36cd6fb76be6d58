//! B_99.01: definitions of the codes used in the register

use crate::core::registry::{BuildContext, FieldFormat, FieldSpec, FieldType, TemplateDescriptor};
use crate::core::relation::{Row, Value};
use crate::domain::TemplateCode;
use std::collections::BTreeMap;

const DEFINED_TEMPLATES: &[TemplateCode] = &[
    TemplateCode::B_02_02,
    TemplateCode::B_05_01,
    TemplateCode::B_05_02,
    TemplateCode::B_06_01,
    TemplateCode::B_07_01,
];

pub const CODE_DEFINITIONS: TemplateDescriptor = TemplateDescriptor {
    code: TemplateCode::B_99_01,
    title: "Definitions of codes used",
    fields: &[
        FieldSpec::mandatory("c0010", "Code list", FieldType::Text),
        FieldSpec::mandatory("c0020", "Code", FieldType::Text),
        FieldSpec::mandatory("c0030", "Definition", FieldType::Text),
    ],
    dependencies: DEFINED_TEMPLATES,
    sources: &[],
    build: build_definitions,
};

/// Every vocabulary code that occurs in the defined templates, ordered by
/// code list then code. Values outside their vocabulary are left to the
/// format rules.
fn build_definitions(ctx: &BuildContext<'_>) -> Vec<Row> {
    let mut used: BTreeMap<(&'static str, &'static str), &'static str> = BTreeMap::new();

    for &code in DEFINED_TEMPLATES {
        let Some(relation) = ctx.relation(code) else {
            continue;
        };
        for field in ctx.fields(code) {
            let Some(FieldFormat::Vocabulary(vocabulary)) = field.format else {
                continue;
            };
            for row in relation.rows() {
                let value = row.get(field.code);
                let values: Vec<&str> = match value {
                    Value::Text(s) => vec![s.as_str()],
                    Value::List(items) => items.iter().map(String::as_str).collect(),
                    _ => Vec::new(),
                };
                for value in values {
                    if let Some(&(code, definition)) =
                        vocabulary.entries.iter().find(|(c, _)| *c == value)
                    {
                        used.insert((vocabulary.name, code), definition);
                    }
                }
            }
        }
    }

    used.into_iter()
        .map(|((list, code), definition)| {
            vec![Value::text(list), Value::text(code), Value::text(definition)]
        })
        .collect()
}
