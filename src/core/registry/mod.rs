//! Template descriptor registry
//!
//! Every template is data: an ordered field schema, the templates it depends
//! on, the source kinds it reads and a pure build function. The rest of the
//! pipeline only ever sees descriptors, so adding a template means registering
//! one more descriptor.
//!
//! ```rust
//! use dora_roi::core::registry::TemplateRegistry;
//! use dora_roi::domain::TemplateCode;
//!
//! let registry = TemplateRegistry::standard().unwrap();
//! let contracts = registry.descriptor(TemplateCode::B_02_01).unwrap();
//! assert_eq!(contracts.dependencies, &[TemplateCode::B_05_01]);
//! ```

pub mod schema;
pub mod templates;
pub mod vocabulary;

pub use schema::{FieldFormat, FieldSpec, FieldType, Presence};
pub use vocabulary::Vocabulary;

use crate::core::relation::{Relation, RelationSet, Row};
use crate::core::sources::SourceSnapshot;
use crate::domain::{RegistryError, SourceKind, TemplateCode};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Everything a build function may read
pub struct BuildContext<'a> {
    pub reporting_date: NaiveDate,
    pub sources: &'a SourceSnapshot,
    relations: &'a RelationSet,
    registry: &'a TemplateRegistry,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        reporting_date: NaiveDate,
        sources: &'a SourceSnapshot,
        relations: &'a RelationSet,
        registry: &'a TemplateRegistry,
    ) -> Self {
        Self {
            reporting_date,
            sources,
            relations,
            registry,
        }
    }

    /// A materialized prerequisite relation
    pub fn relation(&self, code: TemplateCode) -> Option<&'a Relation> {
        self.relations.get(code)
    }

    /// Field schema of a registered template
    pub fn fields(&self, code: TemplateCode) -> &'static [FieldSpec] {
        self.registry.get(code).map(|d| d.fields).unwrap_or_default()
    }
}

/// Pure mapping from sources and prerequisite relations to rows
pub type BuildFn = fn(&BuildContext<'_>) -> Vec<Row>;

/// Declarative definition of one template
#[derive(Debug, Clone, Copy)]
pub struct TemplateDescriptor {
    pub code: TemplateCode,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    pub dependencies: &'static [TemplateCode],
    pub sources: &'static [SourceKind],
    pub build: BuildFn,
}

impl TemplateDescriptor {
    pub fn field(&self, code: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.code == code)
    }

    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.code).collect()
    }
}

/// Registered descriptors keyed by template code
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    descriptors: BTreeMap<TemplateCode, TemplateDescriptor>,
}

impl TemplateRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the fifteen standard templates
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for descriptor in templates::standard_descriptors() {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Registers a descriptor
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDescriptor` if the code is taken.
    pub fn register(&mut self, descriptor: TemplateDescriptor) -> Result<(), RegistryError> {
        if self.descriptors.contains_key(&descriptor.code) {
            return Err(RegistryError::DuplicateDescriptor(
                descriptor.code.to_string(),
            ));
        }
        self.descriptors.insert(descriptor.code, descriptor);
        Ok(())
    }

    pub fn get(&self, code: TemplateCode) -> Option<&TemplateDescriptor> {
        self.descriptors.get(&code)
    }

    pub fn descriptor(&self, code: TemplateCode) -> Result<&TemplateDescriptor, RegistryError> {
        self.get(code)
            .ok_or_else(|| RegistryError::UnknownTemplate(code.to_string()))
    }

    pub fn contains(&self, code: TemplateCode) -> bool {
        self.descriptors.contains_key(&code)
    }

    pub fn codes(&self) -> impl Iterator<Item = TemplateCode> + '_ {
        self.descriptors.keys().copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &TemplateDescriptor> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn no_rows(_: &BuildContext<'_>) -> Vec<Row> {
        Vec::new()
    }

    #[test]
    fn test_standard_registry_has_fifteen_templates() {
        let registry = TemplateRegistry::standard().unwrap();
        assert_eq!(registry.len(), 15);
        assert_eq!(
            registry.codes().collect::<Vec<_>>(),
            TemplateCode::STANDARD.to_vec()
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = TemplateRegistry::standard().unwrap();
        let duplicate = TemplateDescriptor {
            code: TemplateCode::B_01_01,
            title: "Duplicate",
            fields: &[],
            dependencies: &[],
            sources: &[],
            build: no_rows,
        };
        assert_eq!(
            registry.register(duplicate).unwrap_err(),
            RegistryError::DuplicateDescriptor("B_01.01".to_string())
        );
    }

    #[test]
    fn test_field_codes_are_unique_and_ordered() {
        let registry = TemplateRegistry::standard().unwrap();
        for descriptor in registry.descriptors() {
            let codes = descriptor.columns();
            let unique: BTreeSet<_> = codes.iter().collect();
            assert_eq!(unique.len(), codes.len(), "{}", descriptor.code);
            let mut sorted = codes.clone();
            sorted.sort();
            assert_eq!(sorted, codes, "{}", descriptor.code);
        }
    }

    #[test]
    fn test_dependencies_are_registered() {
        let registry = TemplateRegistry::standard().unwrap();
        for descriptor in registry.descriptors() {
            for dependency in descriptor.dependencies {
                assert!(registry.contains(*dependency), "{}", descriptor.code);
            }
        }
    }

    #[test]
    fn test_unknown_descriptor() {
        let registry = TemplateRegistry::new();
        assert!(matches!(
            registry.descriptor(TemplateCode::B_99_01),
            Err(RegistryError::UnknownTemplate(_))
        ));
    }
}
