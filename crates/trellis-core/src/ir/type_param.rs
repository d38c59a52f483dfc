//! Field type expressions and nullability.

use std::fmt;

use crate::refs::TypeRef;

/// Type of a field or argument: a named type, possibly wrapped in lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeParam {
    Named(TypeRef),
    List(Box<TypeParam>),
}

impl TypeParam {
    pub fn named(type_ref: TypeRef) -> Self {
        Self::Named(type_ref)
    }

    pub fn list(inner: impl Into<TypeParam>) -> Self {
        Self::List(Box::new(inner.into()))
    }

    /// The named type at the bottom of any list wrapping.
    #[must_use]
    pub fn base(&self) -> &TypeRef {
        match self {
            Self::Named(r) => r,
            Self::List(inner) => inner.base(),
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Renders the type as it appears in SDL, e.g. `[Post!]!`.
    #[must_use]
    pub fn render(&self, nullability: &Nullability) -> String {
        let inner = match self {
            Self::Named(r) => r.name().to_string(),
            Self::List(inner) => format!("[{}]", inner.render(&nullability.items())),
        };
        if nullability.is_nullable() {
            inner
        } else {
            format!("{inner}!")
        }
    }
}

impl From<TypeRef> for TypeParam {
    fn from(type_ref: TypeRef) -> Self {
        Self::Named(type_ref)
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Nullability::Bool(true)))
    }
}

/// Nullability of a field value, structured for lists of lists.
///
/// `Bool(b)` sets the outer value and leaves list items non-null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Nullability {
    Bool(bool),
    List { list: bool, items: Box<Nullability> },
}

impl Default for Nullability {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl Nullability {
    pub fn nullable() -> Self {
        Self::Bool(true)
    }

    pub fn non_null() -> Self {
        Self::Bool(false)
    }

    /// Nullability for a list and its items.
    pub fn list(list: bool, items: bool) -> Self {
        Self::List {
            list,
            items: Box::new(Self::Bool(items)),
        }
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::List { list, .. } => *list,
        }
    }

    /// Nullability of the items one list level down.
    #[must_use]
    pub fn items(&self) -> Nullability {
        match self {
            Self::Bool(_) => Self::Bool(false),
            Self::List { items, .. } => (**items).clone(),
        }
    }
}

impl From<bool> for Nullability {
    fn from(nullable: bool) -> Self {
        Self::Bool(nullable)
    }
}
