//! Plugin contract, registry, and hook pipeline.
//!
//! A plugin observes and rewrites configuration while the schema is built.
//! Every hook is optional. For a builder configured with plugins `[a, b]`,
//! each hook runs as a sequential fold: `b(a(config))`. Plugin authors must
//! not assume any ordering beyond "configured order, sequential fold".
//!
//! ## Lifecycle
//!
//! For each type, in declaration order:
//! 1. `on_type_config`
//! 2. for each field, in declaration order: `on_input_field_config` for each
//!    argument, then `on_output_field_config`, then `wrap_resolve`
//!    (input object fields and enum values go through
//!    `on_input_field_config` / `on_enum_value_config` instead)
//!
//! Then, once per build:
//! 3. `on_schema_build` over the whole IR
//! 4. `after_build` over the compiled engine schema
//!
//! ## Resolver wrapping
//!
//! `wrap_resolve` receives the resolver produced by the previous plugin and
//! returns a replacement. The last configured plugin's wrapper is therefore
//! the outermost at call time: with `[a, b]` a call runs
//! `b-before, a-before, base, a-after, b-after`.

mod pipeline;
mod registry;

pub use registry::{PluginConstructor, PluginRegistry};

pub(crate) use pipeline::Pipeline;
pub(crate) use registry::PluginInstance;

use async_graphql::dynamic::Schema;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::config::SchemaBuilderConfig;
use crate::error::PluginError;
use crate::ir::{EnumValueConfig, InputFieldConfig, OutputFieldConfig, SchemaIr, TypeConfig};
use crate::refs::TypeRef;
use crate::resolver::Resolver;

/// A schema-construction plugin.
///
/// Hooks that return a config must return a complete replacement of the same
/// element; identity (kind, name, parent) must not change. A hook returning
/// `Err` or panicking aborts the build with
/// [`SchemaError::PluginHook`](crate::SchemaError::PluginHook).
///
/// # Example
///
/// ```ignore
/// struct Deprecations;
///
/// impl Plugin for Deprecations {
///     fn on_output_field_config(
///         &self,
///         mut config: OutputFieldConfig,
///         _cx: &HookContext<'_>,
///     ) -> Result<OutputFieldConfig, PluginError> {
///         if config.name().starts_with("legacy") {
///             config.deprecation_reason = Some("Use the new field".into());
///         }
///         Ok(config)
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    fn on_type_config(
        &self,
        config: TypeConfig,
        _cx: &HookContext<'_>,
    ) -> Result<TypeConfig, PluginError> {
        Ok(config)
    }

    fn on_output_field_config(
        &self,
        config: OutputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<OutputFieldConfig, PluginError> {
        Ok(config)
    }

    /// Runs for arguments and input object fields.
    fn on_input_field_config(
        &self,
        config: InputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<InputFieldConfig, PluginError> {
        Ok(config)
    }

    fn on_enum_value_config(
        &self,
        config: EnumValueConfig,
        _cx: &HookContext<'_>,
    ) -> Result<EnumValueConfig, PluginError> {
        Ok(config)
    }

    /// Wraps the resolver of an object or root field. Interface fields are
    /// wrapped through the objects that inherit them.
    fn wrap_resolve(
        &self,
        resolver: Resolver,
        _field: &OutputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<Resolver, PluginError> {
        Ok(resolver)
    }

    /// Whole-schema transform after every type and field hook has run.
    fn on_schema_build(
        &self,
        ir: SchemaIr,
        _config: &SchemaBuilderConfig,
    ) -> Result<SchemaIr, PluginError> {
        Ok(ir)
    }

    /// Runs on the compiled engine schema.
    fn after_build(
        &self,
        schema: Schema,
        _config: &SchemaBuilderConfig,
    ) -> Result<Schema, PluginError> {
        Ok(schema)
    }
}

/// What a hook may look at besides the config it is folding.
#[derive(Clone, Copy)]
pub struct HookContext<'a> {
    config: &'a SchemaBuilderConfig,
    types: &'a IndexMap<String, TypeConfig>,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        config: &'a SchemaBuilderConfig,
        types: &'a IndexMap<String, TypeConfig>,
    ) -> Self {
        Self { config, types }
    }

    /// The builder configuration.
    #[must_use]
    pub fn config(&self) -> &'a SchemaBuilderConfig {
        self.config
    }

    /// Decodes the builder-level options of `plugin`.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::InvalidOptions` if the options do not decode as `T`.
    pub fn plugin_options<T: DeserializeOwned>(
        &self,
        plugin: &str,
    ) -> Result<Option<T>, PluginError> {
        self.config.plugin_options(plugin)
    }

    /// Looks up a type config by ref.
    ///
    /// Types already visited in this build are returned after their
    /// `on_type_config` fold; later types are returned as declared.
    #[must_use]
    pub fn type_config(&self, type_ref: &TypeRef) -> Option<&'a TypeConfig> {
        self.types
            .get(type_ref.name())
            .filter(|config| config.kind() == type_ref.kind())
    }

    #[must_use]
    pub fn type_named(&self, name: &str) -> Option<&'a TypeConfig> {
        self.types.get(name)
    }
}
