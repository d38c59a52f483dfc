//! Field builders handed to field-definition callbacks.
//!
//! Callbacks run at build time, once per build, after every declaration has
//! been made. Builder methods return refs immediately; name collisions are
//! recorded and reported when the build collects the fields.

use std::future::Future;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::ir::{
    Extensions, FieldKind, InputFieldConfig, InputFieldKind, Nullability, OutputFieldConfig,
    PluginOptions, TypeParam,
};
use crate::refs::{FieldRef, InputFieldRef, TypeRef};
use crate::resolver::{
    EventStream, ResolveParams, ResolveResult, Resolver, Subscriber, property_resolver, resolver,
    subscriber,
};

/// Callback declaring the fields of an object or interface.
pub(crate) type FieldsFn = Arc<dyn Fn(&mut FieldBuilder) + Send + Sync>;

/// Callback declaring the fields of an input object.
pub(crate) type InputFieldsFn = Arc<dyn Fn(&mut InputFieldBuilder) + Send + Sync>;

/// Options of a single output field.
#[derive(Clone)]
pub struct FieldOptions {
    type_param: TypeParam,
    nullable: Nullability,
    args: Vec<(String, InputFieldOptions)>,
    description: Option<String>,
    deprecation_reason: Option<String>,
    resolver: Option<Resolver>,
    subscriber: Option<Subscriber>,
    extensions: Extensions,
    options: PluginOptions,
}

impl FieldOptions {
    /// Field returning `type_param`; non-null unless [`nullable`](Self::nullable) is set.
    pub fn new(type_param: impl Into<TypeParam>) -> Self {
        Self {
            type_param: type_param.into(),
            nullable: Nullability::default(),
            args: Vec::new(),
            description: None,
            deprecation_reason: None,
            resolver: None,
            subscriber: None,
            extensions: Extensions::new(),
            options: PluginOptions::new(),
        }
    }

    /// Field returning a list of `item`.
    pub fn list(item: TypeRef) -> Self {
        Self::new(TypeParam::list(item))
    }

    #[must_use]
    pub fn nullable(mut self, nullable: impl Into<Nullability>) -> Self {
        self.nullable = nullable.into();
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, arg: InputFieldOptions) -> Self {
        self.args.push((name.into(), arg));
        self
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

    /// Sets the resolver from an async closure.
    #[must_use]
    pub fn resolve<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        self.resolver = Some(resolver(f));
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the event stream producer of a subscription field.
    #[must_use]
    pub fn subscribe<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = async_graphql::Result<EventStream>> + Send + 'static,
    {
        self.subscriber = Some(subscriber(f));
        self
    }

    /// Stores `value` under the plugin namespace `namespace`.
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
}

/// Options of an argument or input object field.
#[derive(Debug, Clone)]
pub struct InputFieldOptions {
    type_param: TypeParam,
    required: bool,
    default_value: Option<Value>,
    description: Option<String>,
    extensions: Extensions,
    options: PluginOptions,
}

impl InputFieldOptions {
    /// Optional input of `type_param`.
    pub fn of(type_param: impl Into<TypeParam>) -> Self {
        Self {
            type_param: type_param.into(),
            required: false,
            default_value: None,
            description: None,
            extensions: Extensions::new(),
            options: PluginOptions::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(TypeRef::string())
    }

    pub fn id() -> Self {
        Self::of(TypeRef::id())
    }

    pub fn int() -> Self {
        Self::of(TypeRef::int())
    }

    pub fn float() -> Self {
        Self::of(TypeRef::float())
    }

    pub fn boolean() -> Self {
        Self::of(TypeRef::boolean())
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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

    fn into_config(self, parent: &str, name: &str, kind: InputFieldKind) -> InputFieldConfig {
        let mut config = InputFieldConfig::new(parent, name, kind, self.type_param);
        config.required = self.required;
        config.default_value = self.default_value;
        config.description = self.description;
        config.extensions = self.extensions;
        config.options = self.options;
        config
    }
}

/// Collects the output fields of one object or interface.
///
/// # Example
///
/// ```ignore
/// builder.object_type(
///     "User",
///     ObjectTypeOptions::new().fields(|t| {
///         t.expose_id("id");
///         t.expose_string("name");
///         t.field(
///             "posts",
///             FieldOptions::list(TypeRef::object("Post"))
///                 .arg("take", InputFieldOptions::int().default_value(10))
///                 .resolve(|params| async move { load_posts(&params).await }),
///         );
///     }),
/// )?;
/// ```
pub struct FieldBuilder {
    parent: Arc<str>,
    kind: FieldKind,
    fields: IndexMap<String, OutputFieldConfig>,
    error: Option<SchemaError>,
}

impl FieldBuilder {
    pub(crate) fn new(parent: &str, kind: FieldKind) -> Self {
        Self {
            parent: parent.into(),
            kind,
            fields: IndexMap::new(),
            error: None,
        }
    }

    /// Name of the type the fields are declared on.
    #[must_use]
    pub fn parent_type(&self) -> &str {
        &self.parent
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    fn record(&mut self, error: SchemaError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Declares a field.
    pub fn field(&mut self, name: &str, options: FieldOptions) -> FieldRef {
        let field_ref = FieldRef::new(Arc::clone(&self.parent), name);

        if self.fields.contains_key(name) {
            self.record(SchemaError::duplicate_field(&*self.parent, name));
            return field_ref;
        }
        if options.subscriber.is_some() && self.kind != FieldKind::Subscription {
            self.record(SchemaError::InvalidTypeUsage {
                reference: field_ref.to_string(),
                usage: "a subscription field".into(),
            });
            return field_ref;
        }

        let mut config =
            OutputFieldConfig::new(Arc::clone(&self.parent), name, self.kind, options.type_param);
        config.nullable = options.nullable;
        config.description = options.description;
        config.deprecation_reason = options.deprecation_reason;
        config.resolver = options.resolver;
        config.subscriber = options.subscriber;
        config.extensions = options.extensions;
        config.options = options.options;

        let arg_parent = config.arg_parent();
        for (arg_name, arg) in options.args {
            if config.args.contains_key(&arg_name) {
                self.record(SchemaError::duplicate_field(arg_parent.as_str(), arg_name));
                return field_ref;
            }
            let arg = arg.into_config(&arg_parent, &arg_name, InputFieldKind::Arg);
            config.args.insert(arg_name, arg);
        }

        self.fields.insert(name.to_string(), config);
        field_ref
    }

    /// Declares a field that reads `property` from the parent value.
    pub fn expose(&mut self, name: &str, property: &str, options: FieldOptions) -> FieldRef {
        self.field(name, options.resolver(property_resolver(property)))
    }

    pub fn expose_string(&mut self, name: &str) -> FieldRef {
        self.field(name, FieldOptions::new(TypeRef::string()))
    }

    pub fn expose_id(&mut self, name: &str) -> FieldRef {
        self.field(name, FieldOptions::new(TypeRef::id()))
    }

    pub fn expose_int(&mut self, name: &str) -> FieldRef {
        self.field(name, FieldOptions::new(TypeRef::int()))
    }

    pub fn expose_float(&mut self, name: &str) -> FieldRef {
        self.field(name, FieldOptions::new(TypeRef::float()))
    }

    pub fn expose_boolean(&mut self, name: &str) -> FieldRef {
        self.field(name, FieldOptions::new(TypeRef::boolean()))
    }

    /// Declares a non-null `String` field resolved by `resolve`.
    pub fn string<F, Fut>(&mut self, name: &str, resolve: F) -> FieldRef
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        self.field(name, FieldOptions::new(TypeRef::string()).resolve(resolve))
    }

    pub fn id<F, Fut>(&mut self, name: &str, resolve: F) -> FieldRef
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        self.field(name, FieldOptions::new(TypeRef::id()).resolve(resolve))
    }

    pub fn int<F, Fut>(&mut self, name: &str, resolve: F) -> FieldRef
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        self.field(name, FieldOptions::new(TypeRef::int()).resolve(resolve))
    }

    pub fn float<F, Fut>(&mut self, name: &str, resolve: F) -> FieldRef
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        self.field(name, FieldOptions::new(TypeRef::float()).resolve(resolve))
    }

    pub fn boolean<F, Fut>(&mut self, name: &str, resolve: F) -> FieldRef
    where
        F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolveResult> + Send + 'static,
    {
        self.field(name, FieldOptions::new(TypeRef::boolean()).resolve(resolve))
    }

    pub(crate) fn finish(self) -> Result<IndexMap<String, OutputFieldConfig>, SchemaError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.fields),
        }
    }
}

/// Collects the fields of one input object.
pub struct InputFieldBuilder {
    parent: Arc<str>,
    fields: IndexMap<String, InputFieldConfig>,
    error: Option<SchemaError>,
}

impl InputFieldBuilder {
    pub(crate) fn new(parent: &str) -> Self {
        Self {
            parent: parent.into(),
            fields: IndexMap::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn parent_type(&self) -> &str {
        &self.parent
    }

    pub fn field(&mut self, name: &str, options: InputFieldOptions) -> InputFieldRef {
        let input_ref = InputFieldRef::new(Arc::clone(&self.parent), name);

        if self.fields.contains_key(name) {
            if self.error.is_none() {
                self.error = Some(SchemaError::duplicate_field(&*self.parent, name));
            }
            return input_ref;
        }

        let config = options.into_config(&self.parent, name, InputFieldKind::InputObject);
        self.fields.insert(name.to_string(), config);
        input_ref
    }

    pub(crate) fn finish(self) -> Result<IndexMap<String, InputFieldConfig>, SchemaError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.fields),
        }
    }
}
