//! Builder configuration.
//!
//! The configuration names the plugins a builder runs, in order, and carries
//! each plugin's builder-level options under its name. It can be written in
//! code or loaded from TOML.
//!
//! # Example Configuration
//!
//! ```toml
//! plugins = ["directives", "scope_auth"]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//!
//! [plugin_options.directives]
//! unordered = false
//!
//! [plugin_options.scope_auth]
//! unauthorized_error = "Not authorized"
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::SchemaBuilder as EngineBuilder;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{PluginError, SchemaError};

/// Configuration for a [`SchemaBuilder`](crate::SchemaBuilder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaBuilderConfig {
    /// Plugin names in the order their hooks run.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Maximum query depth allowed by the compiled schema.
    /// Default: unlimited
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Maximum query complexity allowed by the compiled schema.
    /// Default: unlimited
    #[serde(default)]
    pub max_complexity: Option<usize>,

    /// Enable introspection queries on the compiled schema.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Builder-level options, keyed by plugin name.
    #[serde(default)]
    pub plugin_options: IndexMap<String, JsonValue>,
}

fn default_introspection() -> bool {
    true
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            max_depth: None,
            max_complexity: None,
            introspection: default_introspection(),
            plugin_options: IndexMap::new(),
        }
    }
}

impl SchemaBuilderConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidConfig` if the document does not parse.
    pub fn from_toml_str(source: &str) -> Result<Self, SchemaError> {
        toml::from_str(source).map_err(|e| SchemaError::InvalidConfig(e.to_string()))
    }

    #[must_use]
    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_plugin_options(mut self, plugin: impl Into<String>, options: JsonValue) -> Self {
        self.plugin_options.insert(plugin.into(), options);
        self
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
        match self.plugin_options.get(plugin) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| PluginError::invalid_options(plugin, e)),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == Some(0) {
            return Err("max_depth must be > 0".into());
        }
        if self.max_complexity == Some(0) {
            return Err("max_complexity must be > 0".into());
        }
        if self.plugins.iter().any(|p| p.trim().is_empty()) {
            return Err("plugin names must not be blank".into());
        }
        Ok(())
    }
}

/// Registers one piece of request-independent data on the engine schema.
pub(crate) type SchemaData = Arc<dyn Fn(EngineBuilder) -> EngineBuilder + Send + Sync>;

/// Per-build overrides passed to [`SchemaBuilder::to_schema`](crate::SchemaBuilder::to_schema).
#[derive(Clone, Default)]
pub struct BuildOptions {
    pub max_depth: Option<usize>,
    pub max_complexity: Option<usize>,
    pub introspection: Option<bool>,
    data: Vec<SchemaData>,
}

impl BuildOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn max_complexity(mut self, complexity: usize) -> Self {
        self.max_complexity = Some(complexity);
        self
    }

    #[must_use]
    pub fn introspection(mut self, enabled: bool) -> Self {
        self.introspection = Some(enabled);
        self
    }

    /// Adds data to the compiled schema, available to every request.
    /// The pipeline never reads it.
    #[must_use]
    pub fn data<D: Any + Clone + Send + Sync>(mut self, data: D) -> Self {
        self.data.push(Arc::new(move |builder| builder.data(data.clone())));
        self
    }

    pub(crate) fn schema_data(&self) -> &[SchemaData] {
        &self.data
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("max_depth", &self.max_depth)
            .field("max_complexity", &self.max_complexity)
            .field("introspection", &self.introspection)
            .field("data", &self.data.len())
            .finish()
    }
}

/// Engine limits after applying build overrides to the builder config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EngineLimits {
    pub max_depth: Option<usize>,
    pub max_complexity: Option<usize>,
    pub introspection: bool,
}

impl EngineLimits {
    pub(crate) fn resolve(config: &SchemaBuilderConfig, options: &BuildOptions) -> Self {
        Self {
            max_depth: options.max_depth.or(config.max_depth),
            max_complexity: options.max_complexity.or(config.max_complexity),
            introspection: options.introspection.unwrap_or(config.introspection),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaBuilderConfig::default();
        assert!(config.plugins.is_empty());
        assert_eq!(config.max_depth, None);
        assert_eq!(config.max_complexity, None);
        assert!(config.introspection);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_limits() {
        let mut config = SchemaBuilderConfig::default();
        config.max_depth = Some(0);
        assert!(config.validate().is_err());

        let mut config = SchemaBuilderConfig::default();
        config.max_complexity = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_plugin_name() {
        let config = SchemaBuilderConfig::default().with_plugins(["directives", " "]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            plugins = ["directives", "scope_auth"]
            max_depth = 20
            introspection = false

            [plugin_options.scope_auth]
            unauthorized_error = "nope"
        "#;

        let config = SchemaBuilderConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.plugins, ["directives", "scope_auth"]);
        assert_eq!(config.max_depth, Some(20));
        assert_eq!(config.max_complexity, None);
        assert!(!config.introspection);
        assert_eq!(
            config.plugin_options["scope_auth"],
            json!({ "unauthorized_error": "nope" })
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = SchemaBuilderConfig::from_toml_str("plugins = 3").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConfig(_)));
    }

    #[test]
    fn test_typed_plugin_options() {
        #[derive(Deserialize)]
        struct DirectiveOptions {
            unordered: bool,
        }

        let config = SchemaBuilderConfig::default()
            .with_plugin_options("directives", json!({ "unordered": true }));

        let options: DirectiveOptions = config.plugin_options("directives").unwrap().unwrap();
        assert!(options.unordered);
        assert!(
            config
                .plugin_options::<DirectiveOptions>("scope_auth")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_build_overrides() {
        let config = SchemaBuilderConfig {
            max_depth: Some(10),
            ..Default::default()
        };
        let limits = EngineLimits::resolve(&config, &BuildOptions::new().max_complexity(50));
        assert_eq!(limits.max_depth, Some(10));
        assert_eq!(limits.max_complexity, Some(50));
        assert!(limits.introspection);

        let limits = EngineLimits::resolve(&config, &BuildOptions::new().introspection(false));
        assert!(!limits.introspection);
    }
}
