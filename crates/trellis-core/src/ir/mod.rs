//! Schema intermediate representation.
//!
//! [`SchemaIr`] is what the pipeline hands to `on_schema_build` and what the
//! compile step lowers into the engine schema. All maps preserve declaration
//! order so builds and error messages are reproducible.

mod config;
mod options;
mod type_param;

pub use config::{
    EnumValueConfig, FieldKind, InputFieldConfig, InputFieldKind, IsTypeOf, OutputFieldConfig,
    ScalarValidator, TypeConfig,
};
pub use options::{DIRECTIVES_EXTENSION, Extensions, PluginOptions};
pub use type_param::{Nullability, TypeParam};

use indexmap::IndexMap;

use crate::refs::{TypeKind, TypeRef};

/// Names of the root operation types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootTypes {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

impl RootTypes {
    /// Field kind for fields declared on `type_name`.
    #[must_use]
    pub fn field_kind(&self, type_name: &str, kind: TypeKind) -> FieldKind {
        if self.query.as_deref() == Some(type_name) {
            FieldKind::Query
        } else if self.mutation.as_deref() == Some(type_name) {
            FieldKind::Mutation
        } else if self.subscription.as_deref() == Some(type_name) {
            FieldKind::Subscription
        } else if kind == TypeKind::Interface {
            FieldKind::Interface
        } else {
            FieldKind::Object
        }
    }
}

/// Whole-schema configuration, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct SchemaIr {
    pub types: IndexMap<String, TypeConfig>,
    /// Output fields of objects and interfaces, by parent type.
    pub fields: IndexMap<String, IndexMap<String, OutputFieldConfig>>,
    /// Fields of input objects, by parent type.
    pub input_fields: IndexMap<String, IndexMap<String, InputFieldConfig>>,
    /// Values of enums, by parent type.
    pub enum_values: IndexMap<String, IndexMap<String, EnumValueConfig>>,
    pub roots: RootTypes,
}

impl SchemaIr {
    /// Looks up the config a ref points at, checking the kind.
    #[must_use]
    pub fn type_config(&self, type_ref: &TypeRef) -> Option<&TypeConfig> {
        self.types
            .get(type_ref.name())
            .filter(|config| config.kind() == type_ref.kind())
    }

    /// Object types implementing `interface`, in declaration order.
    #[must_use]
    pub fn implementers(&self, interface: &str) -> Vec<&TypeConfig> {
        self.types
            .values()
            .filter(|t| t.kind() == TypeKind::Object)
            .filter(|t| t.interfaces.iter().any(|i| i.name() == interface))
            .collect()
    }

    /// Concrete object types a value of abstract type `name` may have.
    #[must_use]
    pub fn possible_types(&self, name: &str) -> Vec<&TypeConfig> {
        match self.types.get(name) {
            Some(t) if t.kind() == TypeKind::Union => t
                .members
                .iter()
                .filter_map(|m| self.types.get(m.name()))
                .collect(),
            Some(t) if t.kind() == TypeKind::Interface => self.implementers(name),
            _ => Vec::new(),
        }
    }
}
