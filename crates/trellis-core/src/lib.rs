//! # trellis-core
//!
//! Plugin-driven GraphQL schema builder on top of async-graphql's dynamic
//! schema.
//!
//! Applications declare object, interface, union, enum, scalar, and input
//! types through a [`SchemaBuilder`]. Each declaration returns a typed ref
//! right away, so types may reference each other before (or without ever
//! being) fully defined. When the schema is built, every configured plugin
//! gets to observe and rewrite each type, field, argument, and enum value,
//! and to wrap field resolvers, before the result is compiled into an
//! executable `async_graphql::dynamic::Schema`.
//!
//! ## Example
//!
//! ```ignore
//! use trellis_core::{
//!     BuildOptions, FieldOptions, ObjectTypeOptions, PluginRegistry, SchemaBuilder,
//!     SchemaBuilderConfig, TypeRef,
//! };
//!
//! let registry = PluginRegistry::new();
//! let mut builder = SchemaBuilder::new(&registry, SchemaBuilderConfig::default())?;
//!
//! builder.object_type("User", ObjectTypeOptions::new().fields(|t| {
//!     t.expose_id("id");
//!     t.expose_string("name");
//! }))?;
//! builder.query_type(ObjectTypeOptions::new().fields(|t| {
//!     t.field("me", FieldOptions::new(TypeRef::object("User")).resolve(|_| async {
//!         Ok(async_graphql::Value::from_json(serde_json::json!({"id": "1", "name": "Ada"}))?)
//!     }));
//! }))?;
//!
//! let schema = builder.to_schema(BuildOptions::new())?;
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Builder configuration and per-build options
//! - [`refs`] - Type, field, and input field refs
//! - [`ir`] - Configs that plugins observe and rewrite
//! - [`plugin`] - Plugin contract and registry
//! - [`resolver`] - Resolver and subscriber function types
//! - [`schema`] - The builder facade and compilation
//! - [`context`] - Per-request context
//! - [`error`] - Error types

pub mod config;
pub mod context;
pub mod error;
pub mod ir;
pub mod plugin;
pub mod refs;
pub mod resolver;
pub mod schema;

// Re-export main types
pub use config::{BuildOptions, SchemaBuilderConfig};
pub use context::{RequestContext, RequestContextBuilder};
pub use error::{HookPhase, PluginError, SchemaError};
pub use ir::{
    DIRECTIVES_EXTENSION, EnumValueConfig, Extensions, FieldKind, InputFieldConfig,
    InputFieldKind, Nullability, OutputFieldConfig, PluginOptions, RootTypes, SchemaIr,
    TypeConfig, TypeParam,
};
pub use plugin::{HookContext, Plugin, PluginConstructor, PluginRegistry};
pub use refs::{FieldRef, InputFieldRef, TypeKind, TypeRef};
pub use resolver::{ResolveInfo, ResolveParams, Resolver, Subscriber, resolver, subscriber};
pub use schema::{
    EnumTypeOptions, EnumValueOptions, FieldBuilder, FieldOptions, InputFieldBuilder,
    InputFieldOptions, InputObjectTypeOptions, InterfaceTypeOptions, ObjectTypeOptions,
    ScalarTypeOptions, SchemaBuilder, UnionTypeOptions,
};

/// Result type for schema building operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
