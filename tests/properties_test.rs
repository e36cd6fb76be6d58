//! Property tests for dependency ordering and the CSV codec

use chrono::NaiveDate;
use dora_roi::core::registry::{
    BuildContext, FieldSpec, FieldType, TemplateDescriptor, TemplateRegistry,
};
use dora_roi::core::relation::{Relation, Row, Value};
use dora_roi::core::resolver::{plan, plan_for};
use dora_roi::core::serialize::{parse_relation, write_relation};
use dora_roi::domain::TemplateCode;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn no_rows(_: &BuildContext<'_>) -> Vec<Row> {
    Vec::new()
}

/// Registry over the standard codes where each template may only depend on
/// templates earlier in `TemplateCode::STANDARD`, so the graph is acyclic
fn registry_from(edges: &[Vec<bool>]) -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    for (index, code) in TemplateCode::STANDARD.iter().enumerate() {
        let dependencies: Vec<TemplateCode> = edges[index]
            .iter()
            .take(index)
            .enumerate()
            .filter(|(_, &edge)| edge)
            .map(|(dep, _)| TemplateCode::STANDARD[dep])
            .collect();
        registry
            .register(TemplateDescriptor {
                code: *code,
                title: code.as_str(),
                fields: &[],
                dependencies: Box::leak(dependencies.into_boxed_slice()),
                sources: &[],
                build: no_rows,
            })
            .unwrap();
    }
    registry
}

fn edges_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(
        prop::collection::vec(prop::bool::weighted(0.3), TemplateCode::STANDARD.len()),
        TemplateCode::STANDARD.len(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn dependencies_always_precede_dependents(edges in edges_strategy()) {
        let registry = registry_from(&edges);
        let plan = plan(&registry).unwrap();

        prop_assert_eq!(plan.len(), TemplateCode::STANDARD.len());
        for descriptor in registry.descriptors() {
            let own = plan.position(descriptor.code).unwrap();
            for dependency in descriptor.dependencies {
                prop_assert!(plan.position(*dependency).unwrap() < own);
            }
        }
    }

    #[test]
    fn waves_never_hold_a_dependency_pair(edges in edges_strategy()) {
        let registry = registry_from(&edges);
        let plan = plan(&registry).unwrap();

        let flattened: usize = plan.waves.iter().map(Vec::len).sum();
        prop_assert_eq!(flattened, plan.len());
        for wave in &plan.waves {
            for code in wave {
                let descriptor = registry.descriptor(*code).unwrap();
                for dependency in descriptor.dependencies {
                    prop_assert!(!wave.contains(dependency));
                }
            }
        }
    }

    #[test]
    fn subset_plan_is_closed_under_dependencies(
        edges in edges_strategy(),
        pick in 0..TemplateCode::STANDARD.len(),
    ) {
        let registry = registry_from(&edges);
        let requested = TemplateCode::STANDARD[pick];
        let plan = plan_for(&registry, &[requested]).unwrap();

        prop_assert!(plan.contains(requested));
        for code in &plan.order {
            for dependency in registry.descriptor(*code).unwrap().dependencies {
                prop_assert!(plan.contains(*dependency));
            }
        }
    }
}

const CODE: TemplateCode = TemplateCode::new("X_99.01");

static FIELDS: [FieldSpec; 5] = [
    FieldSpec::mandatory("c0010", "Name", FieldType::Text),
    FieldSpec::optional("c0020", "Count", FieldType::Integer),
    FieldSpec::optional("c0030", "Amount", FieldType::Decimal { scale: 2 }),
    FieldSpec::optional("c0040", "Since", FieldType::Date),
    FieldSpec::optional("c0050", "Codes", FieldType::List),
];

fn nullable(inner: BoxedStrategy<Value>) -> BoxedStrategy<Value> {
    prop_oneof![1 => Just(Value::Null), 4 => inner].boxed()
}

fn row_strategy() -> impl Strategy<Value = Row> {
    let text = "[A-Za-z0-9 ,\"'.-]{1,16}".prop_map(Value::Text).boxed();
    let integer = any::<i64>().prop_map(Value::Integer).boxed();
    let amount = (-1_000_000_000i64..1_000_000_000i64)
        .prop_map(|cents| Value::Decimal(Decimal::new(cents, 2)))
        .boxed();
    let date = (0u32..20_000)
        .prop_map(|days| {
            let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
            Value::Date(base + chrono::Duration::days(i64::from(days)))
        })
        .boxed();
    let list = prop::collection::vec("[A-Z0-9]{1,6}", 0..4)
        .prop_map(Value::List)
        .boxed();

    (
        nullable(text),
        nullable(integer),
        nullable(amount),
        nullable(date),
        nullable(list),
    )
        .prop_map(|(a, b, c, d, e)| vec![a, b, c, d, e])
}

proptest! {
    #[test]
    fn csv_reads_back_what_it_writes(rows in prop::collection::vec(row_strategy(), 0..12)) {
        let columns: Vec<&'static str> = FIELDS.iter().map(|f| f.code).collect();
        let relation = Relation::new(CODE, columns, rows).unwrap();

        let bytes = write_relation(&relation, &FIELDS).unwrap();
        let parsed = parse_relation(CODE, &FIELDS, &bytes).unwrap();

        prop_assert_eq!(parsed, relation);
    }

    #[test]
    fn csv_lines_end_with_crlf(rows in prop::collection::vec(row_strategy(), 1..6)) {
        let columns: Vec<&'static str> = FIELDS.iter().map(|f| f.code).collect();
        let relation = Relation::new(CODE, columns, rows).unwrap();

        let text = String::from_utf8(write_relation(&relation, &FIELDS).unwrap()).unwrap();
        prop_assert!(text.ends_with("\r\n"));
        prop_assert!(text.starts_with("c0010,c0020,c0030,c0040,c0050\r\n"));
    }
}
