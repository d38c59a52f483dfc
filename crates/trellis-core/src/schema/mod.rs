//! Schema declaration and compilation.
//!
//! ## Components
//!
//! - [`SchemaBuilder`] - Declares types and fields, then builds the schema
//! - [`FieldBuilder`] / [`InputFieldBuilder`] - Passed to field callbacks
//! - `*TypeOptions` - Per-kind declaration options
//!
//! ## Build
//!
//! 1. Field callbacks run and objects inherit interface fields
//! 2. Declared refs and type usages are checked
//! 3. Type, field, argument, and enum value hooks fold in declaration order
//! 4. `on_schema_build` runs over the whole IR, which is checked again
//! 5. The IR is lowered to an engine schema and `after_build` runs on it

mod builder;
mod compile;
mod fields;
mod options;
pub(crate) mod store;
mod validate;

pub use builder::{MUTATION_TYPE, QUERY_TYPE, SUBSCRIPTION_TYPE, SchemaBuilder, TypeName};
pub use fields::{FieldBuilder, FieldOptions, InputFieldBuilder, InputFieldOptions};
pub use options::{
    EnumTypeOptions, EnumValueOptions, InputObjectTypeOptions, InterfaceTypeOptions,
    ObjectTypeOptions, ScalarTypeOptions, UnionTypeOptions,
};
