//! Named handles to schema elements.
//!
//! A ref is a lookup key into the config store, never the configuration
//! itself. Refs are handed out as soon as a type or field is declared, so
//! types can point at each other before either one has its fields resolved.

use std::fmt;
use std::sync::Arc;

/// Built-in scalar names that always resolve.
pub const BUILTIN_SCALARS: [&str; 5] = ["String", "ID", "Int", "Float", "Boolean"];

/// Checks whether a name is one of the engine's built-in scalars.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// Kind of a named schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

impl TypeKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Interface => "Interface",
            Self::Union => "Union",
            Self::Enum => "Enum",
            Self::Scalar => "Scalar",
            Self::InputObject => "InputObject",
        }
    }

    /// Types that may appear as the type of an output field.
    #[must_use]
    pub fn is_output(&self) -> bool {
        !matches!(self, Self::InputObject)
    }

    /// Types that may appear as the type of an argument or input field.
    #[must_use]
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar | Self::Enum | Self::InputObject)
    }

    /// Interface and union values need a concrete object type at runtime.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface | Self::Union)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    kind: TypeKind,
    name: Arc<str>,
}

impl TypeRef {
    pub fn new(kind: TypeKind, name: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn object(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Object, name)
    }

    pub fn interface(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Interface, name)
    }

    pub fn union(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Union, name)
    }

    pub fn enumeration(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Enum, name)
    }

    pub fn scalar(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::Scalar, name)
    }

    pub fn input(name: impl Into<Arc<str>>) -> Self {
        Self::new(TypeKind::InputObject, name)
    }

    pub fn string() -> Self {
        Self::scalar("String")
    }

    pub fn id() -> Self {
        Self::scalar("ID")
    }

    pub fn int() -> Self {
        Self::scalar("Int")
    }

    pub fn float() -> Self {
        Self::scalar("Float")
    }

    pub fn boolean() -> Self {
        Self::scalar("Boolean")
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Built-in scalar refs resolve without a registered type.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.kind == TypeKind::Scalar && is_builtin_scalar(&self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Ref<{}>", self.kind, self.name)
    }
}

/// Handle to an output field, returned by field builders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    parent_type: Arc<str>,
    name: Arc<str>,
}

impl FieldRef {
    pub(crate) fn new(parent_type: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            parent_type: parent_type.into(),
            name: name.into(),
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

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldRef<{}.{}>", self.parent_type, self.name)
    }
}

/// Handle to an argument or input object field.
///
/// For arguments the parent is `Type.field`; for input object fields it is
/// the input type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputFieldRef {
    parent: Arc<str>,
    name: Arc<str>,
}

impl InputFieldRef {
    pub(crate) fn new(parent: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for InputFieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputFieldRef<{}.{}>", self.parent, self.name)
    }
}
