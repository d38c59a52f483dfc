//! Per-request context threaded through resolvers.
//!
//! The context is constructed per request by the host application and put into
//! the engine request data. Resolvers see it through [`ResolveParams`]. Any
//! per-request caching a plugin needs belongs here, not on the builder.
//!
//! # Example
//!
//! ```ignore
//! use trellis_core::RequestContext;
//!
//! let context = RequestContext::builder()
//!     .with_request_id("req-123")
//!     .with_scopes(["admin", "reader"])
//!     .with_value("userId", serde_json::json!("u1"))
//!     .build();
//!
//! let response = schema
//!     .execute(async_graphql::Request::new("{ me { id } }").data(context))
//!     .await;
//! ```
//!
//! [`ResolveParams`]: crate::resolver::ResolveParams

use std::collections::BTreeSet;

use serde_json::{Map, Value as JsonValue};

/// Request-scoped data visible to every resolver.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request ID for tracing and correlation.
    pub request_id: Option<String>,

    /// Authorization scopes granted to the caller.
    pub scopes: BTreeSet<String>,

    /// Free-form application values.
    pub values: Map<String, JsonValue>,
}

impl RequestContext {
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::new()
    }

    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// True when at least one scope is granted. An empty list grants nothing.
    #[must_use]
    pub fn has_any_scope<S: AsRef<str>>(&self, scopes: &[S]) -> bool {
        scopes.iter().any(|s| self.has_scope(s.as_ref()))
    }

    /// True when every scope is granted.
    #[must_use]
    pub fn has_all_scopes<S: AsRef<str>>(&self, scopes: &[S]) -> bool {
        scopes.iter().all(|s| self.has_scope(s.as_ref()))
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    context: RequestContext,
}

impl RequestContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.context.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.context.scopes.insert(scope.into());
        self
    }

    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.context.values.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> RequestContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_checks() {
        let ctx = RequestContext::builder()
            .with_scopes(["admin", "reader"])
            .build();

        assert!(ctx.has_scope("admin"));
        assert!(ctx.has_any_scope(&["writer", "reader"]));
        assert!(!ctx.has_any_scope(&["writer"]));
        assert!(ctx.has_all_scopes(&["admin", "reader"]));
        assert!(!ctx.has_all_scopes(&["admin", "writer"]));
    }

    #[test]
    fn test_empty_scope_lists() {
        let ctx = RequestContext::default();
        assert!(!ctx.has_any_scope::<&str>(&[]));
        assert!(ctx.has_all_scopes::<&str>(&[]));
    }

    #[test]
    fn test_builder_values() {
        let ctx = RequestContext::builder()
            .with_request_id("req-1")
            .with_value("tenant", serde_json::json!("acme"))
            .build();

        assert_eq!(ctx.request_id.as_deref(), Some("req-1"));
        assert_eq!(ctx.value("tenant"), Some(&serde_json::json!("acme")));
        assert!(ctx.value("missing").is_none());
    }
}
