//! Declarative configuration objects folded by plugin hooks.
//!
//! Identity (kind, name, parent) is fixed at construction and only readable;
//! the payload fields are public so hooks can rewrite them. Hooks that only
//! annotate should merge into `extensions` rather than replace it.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;

use super::options::{Extensions, PluginOptions};
use super::type_param::{Nullability, TypeParam};
use crate::refs::{FieldRef, InputFieldRef, TypeKind, TypeRef};
use crate::resolver::{Resolver, Subscriber};

/// Predicate deciding whether a runtime value belongs to an object type.
pub type IsTypeOf = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Input validator for a custom scalar.
pub type ScalarValidator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Configuration of a named type.
#[derive(Clone)]
pub struct TypeConfig {
    kind: TypeKind,
    name: Arc<str>,
    pub description: Option<String>,
    /// Implemented interfaces (objects and interfaces).
    pub interfaces: Vec<TypeRef>,
    /// Member object types (unions).
    pub members: Vec<TypeRef>,
    /// Scalars only.
    pub specified_by_url: Option<String>,
    /// Scalars only.
    pub validator: Option<ScalarValidator>,
    /// Objects only.
    pub is_type_of: Option<IsTypeOf>,
    pub extensions: Extensions,
    pub options: PluginOptions,
}

impl TypeConfig {
    pub fn new(kind: TypeKind, name: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            specified_by_url: None,
            validator: None,
            is_type_of: None,
            extensions: Extensions::new(),
            options: PluginOptions::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::new(self.kind, Arc::clone(&self.name))
    }
}

impl fmt::Debug for TypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConfig")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("interfaces", &self.interfaces)
            .field("members", &self.members)
            .field("specified_by_url", &self.specified_by_url)
            .field("validator", &self.validator.is_some())
            .field("is_type_of", &self.is_type_of.is_some())
            .field("extensions", &self.extensions)
            .field("options", &self.options)
            .finish()
    }
}

/// Kind of type an output field is defined on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Object,
    Interface,
    Query,
    Mutation,
    Subscription,
}

impl FieldKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Interface => "Interface",
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }
}

/// Configuration of an output field.
#[derive(Clone)]
pub struct OutputFieldConfig {
    parent_type: Arc<str>,
    name: Arc<str>,
    kind: FieldKind,
    pub type_param: TypeParam,
    pub nullable: Nullability,
    pub args: IndexMap<String, InputFieldConfig>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    /// `None` resolves the field by reading the property of the same name
    /// from the parent (the parent itself for subscription fields).
    pub resolver: Option<Resolver>,
    /// Subscription fields only.
    pub subscriber: Option<Subscriber>,
    pub extensions: Extensions,
    pub options: PluginOptions,
}

impl OutputFieldConfig {
    pub fn new(
        parent_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        kind: FieldKind,
        type_param: TypeParam,
    ) -> Self {
        Self {
            parent_type: parent_type.into(),
            name: name.into(),
            kind,
            type_param,
            nullable: Nullability::default(),
            args: IndexMap::new(),
            description: None,
            deprecation_reason: None,
            resolver: None,
            subscriber: None,
            extensions: Extensions::new(),
            options: PluginOptions::new(),
        }
    }

    #[must_use]
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[must_use]
    pub fn field_ref(&self) -> FieldRef {
        FieldRef::new(Arc::clone(&self.parent_type), Arc::clone(&self.name))
    }

    /// Parent key used by this field's arguments (`Type.field`).
    #[must_use]
    pub fn arg_parent(&self) -> String {
        format!("{}.{}", self.parent_type, self.name)
    }

    /// SDL rendering of the return type.
    #[must_use]
    pub fn return_type(&self) -> String {
        self.type_param.render(&self.nullable)
    }

    /// Same field under another parent; used for interface field inheritance.
    pub(crate) fn reparent(&self, parent_type: &str, kind: FieldKind) -> Self {
        let mut copy = self.clone();
        copy.parent_type = parent_type.into();
        copy.kind = kind;
        let arg_parent = copy.arg_parent();
        for arg in copy.args.values_mut() {
            arg.parent = arg_parent.as_str().into();
        }
        copy
    }
}

impl fmt::Debug for OutputFieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputFieldConfig")
            .field("parent_type", &self.parent_type)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type", &self.return_type())
            .field("args", &self.args)
            .field("description", &self.description)
            .field("deprecation_reason", &self.deprecation_reason)
            .field("resolver", &self.resolver.is_some())
            .field("subscriber", &self.subscriber.is_some())
            .field("extensions", &self.extensions)
            .field("options", &self.options)
            .finish()
    }
}

/// Whether an input field is an argument or an input object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFieldKind {
    Arg,
    InputObject,
}

/// Configuration of an argument or input object field.
#[derive(Debug, Clone)]
pub struct InputFieldConfig {
    parent: Arc<str>,
    name: Arc<str>,
    kind: InputFieldKind,
    pub type_param: TypeParam,
    pub required: bool,
    pub default_value: Option<Value>,
    pub description: Option<String>,
    pub extensions: Extensions,
    pub options: PluginOptions,
}

impl InputFieldConfig {
    pub fn new(
        parent: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        kind: InputFieldKind,
        type_param: TypeParam,
    ) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
            kind,
            type_param,
            required: false,
            default_value: None,
            description: None,
            extensions: Extensions::new(),
            options: PluginOptions::new(),
        }
    }

    /// New argument for `field`; plugins use this to inject arguments.
    pub fn argument(
        field: &OutputFieldConfig,
        name: impl Into<Arc<str>>,
        type_param: TypeParam,
    ) -> Self {
        Self::new(field.arg_parent(), name, InputFieldKind::Arg, type_param)
    }

    #[must_use]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> InputFieldKind {
        self.kind
    }

    #[must_use]
    pub fn input_ref(&self) -> InputFieldRef {
        InputFieldRef::new(Arc::clone(&self.parent), Arc::clone(&self.name))
    }

    /// Nullability implied by `required`; list items are always non-null.
    #[must_use]
    pub fn nullability(&self) -> Nullability {
        Nullability::Bool(!self.required)
    }
}

/// Configuration of a single enum value.
#[derive(Debug, Clone)]
pub struct EnumValueConfig {
    parent_type: Arc<str>,
    name: Arc<str>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub extensions: Extensions,
    pub options: PluginOptions,
}

impl EnumValueConfig {
    pub fn new(parent_type: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            parent_type: parent_type.into(),
            name: name.into(),
            description: None,
            deprecation_reason: None,
            extensions: Extensions::new(),
            options: PluginOptions::new(),
        }
    }

    #[must_use]
    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
