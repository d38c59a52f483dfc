//! # trellis-plugins
//!
//! First-party plugins for the trellis schema builder. Each plugin is built
//! only on the public [`Plugin`](trellis_core::Plugin) contract.
//!
//! - [`directives`] - Attaches directive annotations to schema elements
//! - [`scope_auth`] - Guards fields behind request scopes
//!
//! ## Usage
//!
//! ```ignore
//! let mut registry = PluginRegistry::new();
//! trellis_plugins::register_all(&mut registry)?;
//!
//! let config = SchemaBuilderConfig::default().with_plugins(["directives", "scope_auth"]);
//! let builder = SchemaBuilder::new(&registry, config)?;
//! ```

pub mod directives;
pub mod scope_auth;

pub use directives::{Directive, DirectivesOptions, DirectivesPlugin};
pub use scope_auth::{AuthScopes, ScopeAuthOptions, ScopeAuthPlugin};

use trellis_core::{PluginRegistry, SchemaError};

/// Registers every first-party plugin under its default name.
///
/// # Errors
///
/// Returns `SchemaError::DuplicatePluginName` if one of the names is taken.
pub fn register_all(registry: &mut PluginRegistry) -> Result<(), SchemaError> {
    directives::register(registry)?;
    scope_auth::register(registry)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let mut registry = PluginRegistry::new();
        register_all(&mut registry).unwrap();
        assert!(registry.contains(directives::PLUGIN_NAME));
        assert!(registry.contains(scope_auth::PLUGIN_NAME));

        assert!(matches!(
            register_all(&mut registry),
            Err(SchemaError::DuplicatePluginName { .. })
        ));
    }
}
