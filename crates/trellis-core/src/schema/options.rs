//! Declaration options for each type kind.

use std::sync::Arc;

use async_graphql::Value;
use serde_json::Value as JsonValue;

use super::fields::{FieldBuilder, FieldsFn, InputFieldBuilder, InputFieldsFn};
use crate::ir::{EnumValueConfig, Extensions, IsTypeOf, PluginOptions, ScalarValidator, TypeConfig};
use crate::refs::{TypeKind, TypeRef};

/// Options for an object type, including the root types.
#[derive(Clone, Default)]
pub struct ObjectTypeOptions {
    description: Option<String>,
    interfaces: Vec<TypeRef>,
    is_type_of: Option<IsTypeOf>,
    fields: Option<FieldsFn>,
    extensions: Extensions,
    options: PluginOptions,
}

impl ObjectTypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: &TypeRef) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Predicate used to recognise values of this type behind an interface
    /// or union.
    #[must_use]
    pub fn is_type_of(mut self, f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.is_type_of = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn fields(mut self, f: impl Fn(&mut FieldBuilder) + Send + Sync + 'static) -> Self {
        self.fields = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub(crate) fn into_parts(self, name: Arc<str>) -> (TypeConfig, Option<FieldsFn>) {
        let mut config = TypeConfig::new(TypeKind::Object, name);
        config.description = self.description;
        config.interfaces = self.interfaces;
        config.is_type_of = self.is_type_of;
        config.extensions = self.extensions;
        config.options = self.options;
        (config, self.fields)
    }
}

/// Options for an interface type.
#[derive(Clone, Default)]
pub struct InterfaceTypeOptions {
    description: Option<String>,
    interfaces: Vec<TypeRef>,
    fields: Option<FieldsFn>,
    extensions: Extensions,
    options: PluginOptions,
}

impl InterfaceTypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: &TypeRef) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    #[must_use]
    pub fn fields(mut self, f: impl Fn(&mut FieldBuilder) + Send + Sync + 'static) -> Self {
        self.fields = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub(crate) fn into_parts(self, name: Arc<str>) -> (TypeConfig, Option<FieldsFn>) {
        let mut config = TypeConfig::new(TypeKind::Interface, name);
        config.description = self.description;
        config.interfaces = self.interfaces;
        config.extensions = self.extensions;
        config.options = self.options;
        (config, self.fields)
    }
}

/// Options for a union type.
#[derive(Debug, Clone, Default)]
pub struct UnionTypeOptions {
    description: Option<String>,
    members: Vec<TypeRef>,
    extensions: Extensions,
    options: PluginOptions,
}

impl UnionTypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn member(mut self, member: &TypeRef) -> Self {
        self.members.push(member.clone());
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub(crate) fn into_config(self, name: Arc<str>) -> TypeConfig {
        let mut config = TypeConfig::new(TypeKind::Union, name);
        config.description = self.description;
        config.members = self.members;
        config.extensions = self.extensions;
        config.options = self.options;
        config
    }
}

/// Options for one enum value.
#[derive(Debug, Clone, Default)]
pub struct EnumValueOptions {
    description: Option<String>,
    deprecation_reason: Option<String>,
    extensions: Extensions,
    options: PluginOptions,
}

impl EnumValueOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    fn into_config(self, parent: &str, name: &str) -> EnumValueConfig {
        let mut config = EnumValueConfig::new(parent, name);
        config.description = self.description;
        config.deprecation_reason = self.deprecation_reason;
        config.extensions = self.extensions;
        config.options = self.options;
        config
    }
}

/// Options for an enum type.
#[derive(Debug, Clone, Default)]
pub struct EnumTypeOptions {
    description: Option<String>,
    values: Vec<(String, EnumValueOptions)>,
    extensions: Extensions,
    options: PluginOptions,
}

impl EnumTypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enum with plain values, in the given order.
    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().fold(Self::new(), |options, value| options.value(value))
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn value(self, name: impl Into<String>) -> Self {
        self.value_with(name, EnumValueOptions::new())
    }

    #[must_use]
    pub fn value_with(mut self, name: impl Into<String>, options: EnumValueOptions) -> Self {
        self.values.push((name.into(), options));
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Splits into the type config and its values; a repeated value name is
    /// returned as the error.
    pub(crate) fn into_parts(
        self,
        name: Arc<str>,
    ) -> Result<(TypeConfig, Vec<EnumValueConfig>), String> {
        let mut config = TypeConfig::new(TypeKind::Enum, Arc::clone(&name));
        config.description = self.description;
        config.extensions = self.extensions;
        config.options = self.options;

        let mut values: Vec<EnumValueConfig> = Vec::with_capacity(self.values.len());
        for (value, options) in self.values {
            if values.iter().any(|v| v.name() == value) {
                return Err(value);
            }
            values.push(options.into_config(&name, &value));
        }
        Ok((config, values))
    }
}

/// Options for a custom scalar.
#[derive(Clone, Default)]
pub struct ScalarTypeOptions {
    description: Option<String>,
    specified_by_url: Option<String>,
    validator: Option<ScalarValidator>,
    extensions: Extensions,
    options: PluginOptions,
}

impl ScalarTypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.specified_by_url = Some(url.into());
        self
    }

    /// Rejects input literals for which `f` returns false.
    #[must_use]
    pub fn validator(mut self, f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub(crate) fn into_config(self, name: Arc<str>) -> TypeConfig {
        let mut config = TypeConfig::new(TypeKind::Scalar, name);
        config.description = self.description;
        config.specified_by_url = self.specified_by_url;
        config.validator = self.validator;
        config.extensions = self.extensions;
        config.options = self.options;
        config
    }
}

/// Options for an input object type.
#[derive(Clone, Default)]
pub struct InputObjectTypeOptions {
    description: Option<String>,
    fields: Option<InputFieldsFn>,
    extensions: Extensions,
    options: PluginOptions,
}

impl InputObjectTypeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn fields(mut self, f: impl Fn(&mut InputFieldBuilder) + Send + Sync + 'static) -> Self {
        self.fields = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn option(mut self, namespace: impl Into<String>, value: JsonValue) -> Self {
        self.options.set(namespace, value);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    pub(crate) fn into_parts(self, name: Arc<str>) -> (TypeConfig, Option<InputFieldsFn>) {
        let mut config = TypeConfig::new(TypeKind::InputObject, name);
        config.description = self.description;
        config.extensions = self.extensions;
        config.options = self.options;
        (config, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_object_options_into_config() {
        let node = TypeRef::interface("Node");
        let (config, fields) = ObjectTypeOptions::new()
            .description("A registered user")
            .implements(&node)
            .option("scope_auth", json!({ "any": ["admin"] }))
            .into_parts("User".into());

        assert_eq!(config.kind(), TypeKind::Object);
        assert_eq!(config.interfaces, [node]);
        assert_eq!(config.description.as_deref(), Some("A registered user"));
        assert!(config.options.contains("scope_auth"));
        assert!(fields.is_none());
    }

    #[test]
    fn test_enum_values_keep_order() {
        let (config, values) = EnumTypeOptions::with_values(["ADMIN", "EDITOR"])
            .value_with("GUEST", EnumValueOptions::new().deprecated("Use VIEWER"))
            .into_parts("Role".into())
            .unwrap();

        assert_eq!(config.kind(), TypeKind::Enum);
        let names: Vec<_> = values.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["ADMIN", "EDITOR", "GUEST"]);
        assert_eq!(values[2].deprecation_reason.as_deref(), Some("Use VIEWER"));
        assert_eq!(values[0].parent_type(), "Role");
    }

    #[test]
    fn test_enum_duplicate_value() {
        let err = EnumTypeOptions::with_values(["A", "B", "A"])
            .into_parts("Letters".into())
            .unwrap_err();
        assert_eq!(err, "A");
    }
}
