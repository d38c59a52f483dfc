//! Resolver functions and the parameters they receive.
//!
//! Resolvers are plain composable functions: `wrap_resolve` hooks take the
//! previous resolver and return a new one, and the build folds them into a
//! single resolver per field. Resolvers run at request time and may suspend;
//! the pipeline never calls them itself.

use std::future::Future;
use std::sync::Arc;

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::context::RequestContext;

/// Result of a single field resolution.
pub type ResolveResult = async_graphql::Result<Value>;

/// A field resolver: `(parent, args, context, info) -> future<value>`.
pub type Resolver = Arc<dyn Fn(ResolveParams) -> BoxFuture<'static, ResolveResult> + Send + Sync>;

/// Stream of subscription events.
pub type EventStream = BoxStream<'static, async_graphql::Result<Value>>;

/// Producer of the event stream for a subscription field.
pub type Subscriber = Arc<
    dyn Fn(ResolveParams) -> BoxFuture<'static, async_graphql::Result<EventStream>> + Send + Sync,
>;

/// Static information about the field being resolved.
#[derive(Debug, Clone)]
pub struct ResolveInfo {
    pub parent_type: Arc<str>,
    pub field_name: Arc<str>,
    /// Return type as rendered in SDL (e.g. `[Post!]!`).
    pub return_type: Arc<str>,
}

/// Inputs to a resolver call.
#[derive(Debug, Clone)]
pub struct ResolveParams {
    pub parent: Value,
    pub args: IndexMap<Name, Value>,
    pub context: Arc<RequestContext>,
    pub info: ResolveInfo,
}

impl ResolveParams {
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|v| !matches!(v, Value::Null))
    }

    /// String-like argument (`String`, `ID`, or enum value).
    #[must_use]
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        match self.arg(name)? {
            Value::String(s) => Some(s.as_str()),
            Value::Enum(e) => Some(e.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn arg_i64(&self, name: &str) -> Option<i64> {
        match self.arg(name)? {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Reads a property of the parent object.
    #[must_use]
    pub fn parent_property(&self, property: &str) -> Option<&Value> {
        match &self.parent {
            Value::Object(obj) => obj.get(property),
            _ => None,
        }
    }
}

/// Boxes an async closure into a [`Resolver`].
pub fn resolver<F, Fut>(f: F) -> Resolver
where
    F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolveResult> + Send + 'static,
{
    Arc::new(move |params| Box::pin(f(params)))
}

/// Boxes an async closure into a [`Subscriber`].
pub fn subscriber<F, Fut>(f: F) -> Subscriber
where
    F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = async_graphql::Result<EventStream>> + Send + 'static,
{
    Arc::new(move |params| Box::pin(f(params)))
}

/// Resolver that reads `property` from the parent object; missing is null.
pub fn property_resolver(property: impl Into<Arc<str>>) -> Resolver {
    let property: Arc<str> = property.into();
    Arc::new(move |params| {
        let value = params
            .parent_property(&property)
            .cloned()
            .unwrap_or(Value::Null);
        Box::pin(async move { Ok(value) })
    })
}

/// Resolver that returns the parent itself; the default for subscription fields.
pub fn identity_resolver() -> Resolver {
    Arc::new(|params| Box::pin(async move { Ok(params.parent) }))
}

/// Resolver that always returns the same value.
pub fn constant_resolver(value: Value) -> Resolver {
    Arc::new(move |_| {
        let value = value.clone();
        Box::pin(async move { Ok(value) })
    })
}
