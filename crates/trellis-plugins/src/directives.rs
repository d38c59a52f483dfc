//! Directive annotations.
//!
//! Reads the `directives` option on types, fields, arguments, input fields,
//! and enum values and normalizes it into `extensions["directives"]`, where
//! schema tooling reads it. The option may be a list or a map:
//!
//! ```json
//! [{ "name": "cacheControl", "args": { "maxAge": 60 } }]
//! { "cacheControl": { "maxAge": 60 } }
//! ```
//!
//! By default both normalize to the list form; map values must be argument
//! objects. With the builder option `directives.unordered = true` a list is
//! grouped into a map of directive name to the argument objects it was
//! applied with, and a map is kept as written.
//!
//! The compiled schema carries the normalized directives, so they show up in
//! its SDL.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_graphql::dynamic::Schema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};
use trellis_core::{
    DIRECTIVES_EXTENSION, EnumValueConfig, Extensions, HookContext, InputFieldConfig,
    OutputFieldConfig, Plugin, PluginError, PluginOptions, PluginRegistry, SchemaBuilderConfig,
    SchemaError, SchemaIr, TypeConfig,
};

/// Name the plugin is registered under; also its option namespace.
pub const PLUGIN_NAME: &str = "directives";

/// Extension key the normalized directives are written to.
pub const EXTENSION_KEY: &str = DIRECTIVES_EXTENSION;

/// Builder-level options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectivesOptions {
    /// Normalize into a map of name to argument lists instead of a list.
    pub unordered: bool,
}

/// A directive application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, JsonValue>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: JsonValue) -> Self {
        self.args.insert(name.into(), value);
        self
    }
}

/// Directives as written in element options.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectiveInput {
    List(Vec<Directive>),
    Map(IndexMap<String, JsonValue>),
}

impl DirectiveInput {
    /// Applications in the order written.
    fn into_directives(self) -> Result<Vec<Directive>, PluginError> {
        match self {
            Self::List(list) => Ok(list),
            Self::Map(map) => map
                .into_iter()
                .map(|(name, args)| {
                    let args = into_args(&name, args)?;
                    Ok::<_, PluginError>(Directive { name, args })
                })
                .collect(),
        }
    }
}

fn into_args(name: &str, args: JsonValue) -> Result<Map<String, JsonValue>, PluginError> {
    match args {
        JsonValue::Object(args) => Ok(args),
        JsonValue::Null => Ok(Map::new()),
        other => Err(PluginError::hook(format!(
            "arguments of directive '{name}' must be an object, got {other}"
        ))),
    }
}

/// Attaches directive annotations.
#[derive(Debug, Default)]
pub struct DirectivesPlugin {
    options: DirectivesOptions,
    annotated: AtomicUsize,
}

impl DirectivesPlugin {
    pub fn new(options: DirectivesOptions) -> Self {
        Self {
            options,
            annotated: AtomicUsize::new(0),
        }
    }

    /// Reads and normalizes the `directives` option, if present.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::InvalidOptions` if the option is neither a list
    /// of directives nor a map of directive names, and `PluginError::Hook`
    /// if a map entry's arguments are not an object.
    pub fn normalize(&self, options: &PluginOptions) -> Result<Option<JsonValue>, PluginError> {
        let Some(input) = options.get::<DirectiveInput>(PLUGIN_NAME)? else {
            return Ok(None);
        };

        if !self.options.unordered {
            return serde_json::to_value(input.into_directives()?)
                .map(Some)
                .map_err(|e| PluginError::hook(e.to_string()));
        }

        let directives = match input {
            DirectiveInput::Map(map) => {
                return Ok(Some(JsonValue::Object(map.into_iter().collect())));
            }
            DirectiveInput::List(list) => list,
        };
        let mut grouped: IndexMap<String, Vec<JsonValue>> = IndexMap::new();
        for directive in directives {
            grouped
                .entry(directive.name)
                .or_default()
                .push(JsonValue::Object(directive.args));
        }
        serde_json::to_value(grouped)
            .map(Some)
            .map_err(|e| PluginError::hook(e.to_string()))
    }

    fn annotate(
        &self,
        options: &PluginOptions,
        extensions: &mut Extensions,
    ) -> Result<(), PluginError> {
        if let Some(directives) = self.normalize(options)? {
            extensions.insert(EXTENSION_KEY.to_string(), directives);
        }
        Ok(())
    }
}

impl Plugin for DirectivesPlugin {
    fn on_type_config(
        &self,
        mut config: TypeConfig,
        _cx: &HookContext<'_>,
    ) -> Result<TypeConfig, PluginError> {
        self.annotate(&config.options, &mut config.extensions)?;
        Ok(config)
    }

    fn on_output_field_config(
        &self,
        mut config: OutputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<OutputFieldConfig, PluginError> {
        self.annotate(&config.options, &mut config.extensions)?;
        Ok(config)
    }

    fn on_input_field_config(
        &self,
        mut config: InputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<InputFieldConfig, PluginError> {
        self.annotate(&config.options, &mut config.extensions)?;
        Ok(config)
    }

    fn on_enum_value_config(
        &self,
        mut config: EnumValueConfig,
        _cx: &HookContext<'_>,
    ) -> Result<EnumValueConfig, PluginError> {
        self.annotate(&config.options, &mut config.extensions)?;
        Ok(config)
    }

    fn on_schema_build(
        &self,
        ir: SchemaIr,
        _config: &SchemaBuilderConfig,
    ) -> Result<SchemaIr, PluginError> {
        let annotated = count_annotated(&ir);
        self.annotated.store(annotated, Ordering::Relaxed);
        debug!(annotated, "Normalized directives");
        Ok(ir)
    }

    fn after_build(
        &self,
        schema: Schema,
        _config: &SchemaBuilderConfig,
    ) -> Result<Schema, PluginError> {
        info!(
            annotated = self.annotated.load(Ordering::Relaxed),
            unordered = self.options.unordered,
            "Schema elements annotated with directives"
        );
        Ok(schema)
    }
}

/// Number of schema elements carrying directives.
pub fn count_annotated(ir: &SchemaIr) -> usize {
    let has = |extensions: &Extensions| usize::from(extensions.contains_key(EXTENSION_KEY));

    let types: usize = ir.types.values().map(|t| has(&t.extensions)).sum();
    let fields: usize = ir
        .fields
        .values()
        .flat_map(|fields| fields.values())
        .map(|f| {
            has(&f.extensions) + f.args.values().map(|a| has(&a.extensions)).sum::<usize>()
        })
        .sum();
    let inputs: usize = ir
        .input_fields
        .values()
        .flat_map(|fields| fields.values())
        .map(|f| has(&f.extensions))
        .sum();
    let values: usize = ir
        .enum_values
        .values()
        .flat_map(|values| values.values())
        .map(|v| has(&v.extensions))
        .sum();

    types + fields + inputs + values
}

/// Registers the plugin under [`PLUGIN_NAME`].
///
/// # Errors
///
/// Returns `SchemaError::DuplicatePluginName` if the name is taken.
pub fn register(registry: &mut PluginRegistry) -> Result<(), SchemaError> {
    registry.register(PLUGIN_NAME, |config: &SchemaBuilderConfig| {
        let options = config
            .plugin_options::<DirectivesOptions>(PLUGIN_NAME)?
            .unwrap_or_default();
        Ok(Arc::new(DirectivesPlugin::new(options)) as Arc<dyn Plugin>)
    })
}
