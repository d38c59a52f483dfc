//! Per-plugin option bags and engine-facing extensions.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::PluginError;

/// Free-form engine-level metadata attached to a config (e.g. directives).
pub type Extensions = IndexMap<String, JsonValue>;

/// Extension key holding directive applications. The compiler attaches
/// them to the engine schema, so they show up in the SDL.
///
/// Either a list of `{ "name": .., "args": {..} }` or a map of directive name
/// to arguments, where a list of argument objects applies it repeatedly.
pub const DIRECTIVES_EXTENSION: &str = "directives";

/// Options attached to a type, field, argument, or enum value, namespaced by
/// plugin name.
///
/// Plugins read and write their own namespace; the base config is shared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginOptions(IndexMap<String, JsonValue>);

impl PluginOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn raw(&self, namespace: &str) -> Option<&JsonValue> {
        self.0.get(namespace)
    }

    /// Decodes a namespace into `T`; `Ok(None)` when the namespace is absent.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::InvalidOptions` if the stored value does not
    /// decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>, PluginError> {
        match self.0.get(namespace) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| PluginError::invalid_options(namespace, e)),
        }
    }

    pub fn set(&mut self, namespace: impl Into<String>, value: JsonValue) {
        self.0.insert(namespace.into(), value);
    }

    #[must_use]
    pub fn contains(&self, namespace: &str) -> bool {
        self.0.contains_key(namespace)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, JsonValue)> for PluginOptions {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Complexity {
        cost: u32,
    }

    #[test]
    fn test_typed_access() {
        let mut options = PluginOptions::new();
        options.set("complexity", json!({ "cost": 3 }));

        let parsed: Option<Complexity> = options.get("complexity").unwrap();
        assert_eq!(parsed, Some(Complexity { cost: 3 }));

        let missing: Option<Complexity> = options.get("other").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_invalid_namespace_value() {
        let mut options = PluginOptions::new();
        options.set("complexity", json!("not an object"));

        let err = options.get::<Complexity>("complexity").unwrap_err();
        assert!(matches!(
            err,
            PluginError::InvalidOptions { ref namespace, .. } if namespace == "complexity"
        ));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let options: PluginOptions = [("directives".to_string(), json!(["a"]))]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({ "directives": ["a"] })
        );
    }
}
