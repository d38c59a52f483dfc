//! Error types for schema construction.
//!
//! Every build-time failure is fatal for the build call that hit it; there is
//! no partial-schema recovery. Errors raised inside resolvers at request time
//! are not represented here: they are `async_graphql::Error` values and follow
//! the engine's field-error semantics.

use std::fmt;

use thiserror::Error;

/// Lifecycle phase in which a plugin failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// Plugin construction from the registry.
    Construct,
    /// `on_type_config`.
    TypeConfig,
    /// `on_output_field_config`.
    OutputFieldConfig,
    /// `on_input_field_config`.
    InputFieldConfig,
    /// `on_enum_value_config`.
    EnumValueConfig,
    /// `wrap_resolve`.
    WrapResolve,
    /// `on_schema_build`.
    SchemaBuild,
    /// `after_build`.
    AfterBuild,
}

impl HookPhase {
    /// Returns the hook name as plugin authors see it.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Construct => "construct",
            Self::TypeConfig => "on_type_config",
            Self::OutputFieldConfig => "on_output_field_config",
            Self::InputFieldConfig => "on_input_field_config",
            Self::EnumValueConfig => "on_enum_value_config",
            Self::WrapResolve => "wrap_resolve",
            Self::SchemaBuild => "on_schema_build",
            Self::AfterBuild => "after_build",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a plugin hook.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Hook rejected the configuration it was handed.
    #[error("{0}")]
    Hook(String),

    /// The plugin's options namespace could not be decoded.
    #[error("invalid options in namespace '{namespace}': {source}")]
    InvalidOptions {
        /// Options namespace (normally the plugin name).
        namespace: String,
        /// Decoding failure.
        #[source]
        source: serde_json::Error,
    },

    /// Hook panicked; the payload message is kept for diagnostics.
    #[error("hook panicked: {0}")]
    Panicked(String),
}

impl PluginError {
    /// Create a hook error from a message.
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Create an options decoding error.
    pub fn invalid_options(namespace: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidOptions {
            namespace: namespace.into(),
            source,
        }
    }
}

/// Errors that abort schema construction.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("type name '{name}' is already registered")]
    DuplicateTypeName { name: String },

    #[error("field '{field}' is already defined on type '{parent}'")]
    DuplicateFieldName { parent: String, field: String },

    #[error("plugin '{name}' is already registered")]
    DuplicatePluginName { name: String },

    #[error("plugin '{name}' is not registered")]
    UnknownPlugin { name: String },

    /// A reference was declared or used but never implemented.
    #[error("unresolved reference {reference}")]
    UnresolvedReference { reference: String },

    #[error("reference {reference} resolves to a {actual} type")]
    RefKindMismatch { reference: String, actual: String },

    /// A type was used where its kind is not allowed (e.g. an input object as a field type).
    #[error("{reference} cannot be used as {usage}")]
    InvalidTypeUsage { reference: String, usage: String },

    #[error("plugin '{plugin}' failed in {phase}: {source}")]
    PluginHook {
        plugin: String,
        phase: HookPhase,
        #[source]
        source: PluginError,
    },

    #[error("invalid builder configuration: {0}")]
    InvalidConfig(String),

    /// Hooks left the IR in a state the compiler cannot accept.
    #[error("inconsistent schema configuration: {0}")]
    InconsistentConfig(String),

    /// The engine rejected the lowered schema.
    #[error("schema compilation failed: {0}")]
    Compile(String),
}

impl SchemaError {
    pub(crate) fn duplicate_type(name: impl Into<String>) -> Self {
        Self::DuplicateTypeName { name: name.into() }
    }

    pub(crate) fn duplicate_field(parent: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateFieldName {
            parent: parent.into(),
            field: field.into(),
        }
    }

    pub(crate) fn unresolved(reference: impl fmt::Display) -> Self {
        Self::UnresolvedReference {
            reference: reference.to_string(),
        }
    }

    pub(crate) fn plugin_hook(
        plugin: impl Into<String>,
        phase: HookPhase,
        source: PluginError,
    ) -> Self {
        Self::PluginHook {
            plugin: plugin.into(),
            phase,
            source,
        }
    }

    /// Returns the failing plugin and phase for hook failures.
    #[must_use]
    pub fn hook_origin(&self) -> Option<(&str, HookPhase)> {
        match self {
            Self::PluginHook { plugin, phase, .. } => Some((plugin.as_str(), *phase)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(HookPhase::TypeConfig.to_string(), "on_type_config");
        assert_eq!(HookPhase::WrapResolve.to_string(), "wrap_resolve");
        assert_eq!(HookPhase::AfterBuild.as_str(), "after_build");
    }

    #[test]
    fn test_plugin_hook_message() {
        let err = SchemaError::plugin_hook(
            "directives",
            HookPhase::OutputFieldConfig,
            PluginError::hook("bad directive"),
        );
        assert_eq!(
            err.to_string(),
            "plugin 'directives' failed in on_output_field_config: bad directive"
        );
        assert_eq!(
            err.hook_origin(),
            Some(("directives", HookPhase::OutputFieldConfig))
        );
    }

    #[test]
    fn test_hook_origin_absent_for_other_errors() {
        let err = SchemaError::duplicate_type("User");
        assert!(err.hook_origin().is_none());
        assert_eq!(err.to_string(), "type name 'User' is already registered");
    }
}
