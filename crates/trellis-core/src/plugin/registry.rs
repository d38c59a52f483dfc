//! Plugin constructor registry.
//!
//! The registry maps plugin names to constructors. The host application owns
//! it and registers plugins explicitly before constructing builders, so plugin
//! order never depends on module load order. Each builder instantiates the
//! plugins named in its configuration exactly once and keeps the instances for
//! its lifetime.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::Plugin;
use super::pipeline::guard;
use crate::config::SchemaBuilderConfig;
use crate::error::{HookPhase, PluginError, SchemaError};

/// Builds a plugin instance for one builder.
pub type PluginConstructor =
    Arc<dyn Fn(&SchemaBuilderConfig) -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync>;

/// A plugin instance together with the name it was registered under.
#[derive(Clone)]
pub(crate) struct PluginInstance {
    pub name: String,
    pub plugin: Arc<dyn Plugin>,
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registry of plugin constructors, keyed by name.
///
/// # Example
///
/// ```ignore
/// let mut registry = PluginRegistry::new();
/// registry.register("directives", |config| Ok(Arc::new(DirectivesPlugin::new(config)?)))?;
///
/// let builder = SchemaBuilder::new(
///     &registry,
///     SchemaBuilderConfig::default().with_plugins(["directives"]),
/// )?;
/// ```
#[derive(Clone, Default)]
pub struct PluginRegistry {
    constructors: IndexMap<String, PluginConstructor>,
}

impl PluginRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicatePluginName` if `name` is taken.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        constructor: F,
    ) -> Result<(), SchemaError>
    where
        F: Fn(&SchemaBuilderConfig) -> Result<Arc<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(SchemaError::DuplicatePluginName { name });
        }
        debug!(plugin = %name, "Registered plugin");
        self.constructors.insert(name, Arc::new(constructor));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Instantiates the plugins named by `config`, in configured order.
    ///
    /// A name listed twice is instantiated once, at its first position.
    pub(crate) fn instantiate(
        &self,
        config: &SchemaBuilderConfig,
    ) -> Result<Vec<PluginInstance>, SchemaError> {
        let mut seen = HashSet::new();
        let mut instances = Vec::with_capacity(config.plugins.len());

        for name in &config.plugins {
            if !seen.insert(name.as_str()) {
                debug!(plugin = %name, "Plugin listed more than once, keeping first position");
                continue;
            }

            let constructor = self
                .constructors
                .get(name)
                .ok_or_else(|| SchemaError::UnknownPlugin { name: name.clone() })?;

            let plugin = guard(name, HookPhase::Construct, || constructor(config))?;
            instances.push(PluginInstance {
                name: name.clone(),
                plugin,
            });
        }

        debug!(
            plugins = ?instances.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "Instantiated plugins"
        );
        Ok(instances)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}
