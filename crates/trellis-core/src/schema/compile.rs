//! Lowering of the frozen IR into an `async-graphql` dynamic schema.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dynamic::{
    self, Directive, Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue,
    Interface, InterfaceField, Object, ResolverContext, Scalar, Schema, Subscription,
    SubscriptionField, SubscriptionFieldFuture, Union,
};
use async_graphql::{Error as GraphQLError, Value};
use futures_util::StreamExt;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::config::{EngineLimits, SchemaData};
use crate::context::RequestContext;
use crate::error::SchemaError;
use crate::ir::{
    DIRECTIVES_EXTENSION, Extensions, InputFieldConfig, IsTypeOf, Nullability, OutputFieldConfig,
    SchemaIr, TypeConfig, TypeParam,
};
use crate::refs::TypeKind;
use crate::resolver::{ResolveInfo, ResolveParams, identity_resolver, property_resolver};

/// Compiles the IR into an executable schema.
pub(crate) fn compile(
    ir: &SchemaIr,
    limits: EngineLimits,
    data: &[SchemaData],
) -> Result<Schema, SchemaError> {
    let query = ir
        .roots
        .query
        .as_deref()
        .ok_or_else(|| SchemaError::Compile("no query type declared".into()))?;

    let mut builder = Schema::build(
        query,
        ir.roots.mutation.as_deref(),
        ir.roots.subscription.as_deref(),
    );

    let abstracts = AbstractTypes::new(ir);
    for config in ir.types.values() {
        trace!(kind = %config.kind(), name = %config.name(), "Lowering type");
        builder = match config.kind() {
            TypeKind::Object if ir.roots.subscription.as_deref() == Some(config.name()) => {
                builder.register(lower_subscription(ir, config, &abstracts))
            }
            TypeKind::Object => builder.register(lower_object(ir, config, &abstracts)),
            TypeKind::Interface => builder.register(lower_interface(ir, config)),
            TypeKind::Union => builder.register(lower_union(config)),
            TypeKind::Enum => builder.register(lower_enum(ir, config)),
            TypeKind::Scalar => builder.register(lower_scalar(config)),
            TypeKind::InputObject => builder.register(lower_input_object(ir, config)),
        };
    }

    if let Some(depth) = limits.max_depth {
        builder = builder.limit_depth(depth);
    }
    if let Some(complexity) = limits.max_complexity {
        builder = builder.limit_complexity(complexity);
    }
    if !limits.introspection {
        builder = builder.disable_introspection();
    }
    for register in data {
        builder = register(builder);
    }

    builder
        .finish()
        .map_err(|e| SchemaError::Compile(e.to_string()))
}

/// Directive applications recorded under [`DIRECTIVES_EXTENSION`].
/// Malformed entries are skipped.
fn directives(extensions: &Extensions) -> Vec<Directive> {
    match extensions.get(DIRECTIVES_EXTENSION) {
        Some(JsonValue::Array(list)) => list
            .iter()
            .filter_map(|entry| {
                let name = entry.get("name").and_then(JsonValue::as_str);
                if name.is_none() {
                    trace!(entry = %entry, "Skipping directive without a name");
                }
                Some(directive(name?, entry.get("args")))
            })
            .collect(),
        Some(JsonValue::Object(map)) => map
            .iter()
            .flat_map(|(name, args)| match args {
                JsonValue::Array(applications) => applications
                    .iter()
                    .map(|args| directive(name, Some(args)))
                    .collect(),
                args => vec![directive(name, Some(args))],
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn directive(name: &str, args: Option<&JsonValue>) -> Directive {
    let mut directive = Directive::new(name);
    if let Some(JsonValue::Object(args)) = args {
        for (arg, value) in args {
            if let Ok(value) = Value::from_json(value.clone()) {
                directive = directive.argument(arg, value);
            }
        }
    }
    directive
}

/// Engine type reference for a type expression and its nullability.
fn lower_type(type_param: &TypeParam, nullability: &Nullability) -> dynamic::TypeRef {
    let inner = match type_param {
        TypeParam::Named(type_ref) => dynamic::TypeRef::named(type_ref.name()),
        TypeParam::List(item) => {
            dynamic::TypeRef::List(Box::new(lower_type(item, &nullability.items())))
        }
    };
    if nullability.is_nullable() {
        inner
    } else {
        dynamic::TypeRef::NonNull(Box::new(inner))
    }
}

fn lower_input_value(config: &InputFieldConfig) -> InputValue {
    let mut input = InputValue::new(
        config.name(),
        lower_type(&config.type_param, &config.nullability()),
    );
    if let Some(description) = &config.description {
        input = input.description(description);
    }
    if let Some(default) = &config.default_value {
        input = input.default_value(default.clone());
    }
    for directive in directives(&config.extensions) {
        input = input.directive(directive);
    }
    input
}

fn resolve_info(field: &OutputFieldConfig) -> ResolveInfo {
    ResolveInfo {
        parent_type: field.parent_type().into(),
        field_name: field.name().into(),
        return_type: field.return_type().into(),
    }
}

fn request_context(ctx: &ResolverContext<'_>) -> Arc<RequestContext> {
    if let Some(shared) = ctx.data_opt::<Arc<RequestContext>>() {
        return Arc::clone(shared);
    }
    ctx.data_opt::<RequestContext>()
        .map(|context| Arc::new(context.clone()))
        .unwrap_or_default()
}

fn resolve_params(ctx: &ResolverContext<'_>, info: &ResolveInfo) -> ResolveParams {
    let parent = ctx.parent_value.as_value().cloned().unwrap_or(Value::Null);
    let args = ctx
        .args
        .iter()
        .map(|(name, value)| (name.clone(), value.as_value().clone()))
        .collect();

    ResolveParams {
        parent,
        args,
        context: request_context(ctx),
        info: info.clone(),
    }
}

/// Concrete-type resolution for one interface or union.
struct TypeResolver {
    name: String,
    candidates: Vec<(String, Option<IsTypeOf>)>,
}

impl TypeResolver {
    fn resolve(&self, value: &Value) -> Result<String, GraphQLError> {
        for (name, is_type_of) in &self.candidates {
            if let Some(is_type_of) = is_type_of {
                if is_type_of(value) {
                    return Ok(name.clone());
                }
            }
        }

        if let Value::Object(obj) = value {
            if let Some(Value::String(typename)) = obj.get("__typename") {
                if self.candidates.iter().any(|(name, _)| name == typename) {
                    return Ok(typename.clone());
                }
            }
        }

        Err(GraphQLError::new(format!(
            "Unable to determine the concrete type of a {} value",
            self.name
        )))
    }
}

/// Resolvers for every abstract type, keyed by type name.
struct AbstractTypes(HashMap<String, Arc<TypeResolver>>);

impl AbstractTypes {
    fn new(ir: &SchemaIr) -> Self {
        let resolvers = ir
            .types
            .values()
            .filter(|t| t.kind().is_abstract())
            .map(|t| {
                let candidates = ir
                    .possible_types(t.name())
                    .into_iter()
                    .map(|c| (c.name().to_string(), c.is_type_of.clone()))
                    .collect();
                let resolver = TypeResolver {
                    name: t.name().to_string(),
                    candidates,
                };
                (t.name().to_string(), Arc::new(resolver))
            })
            .collect();
        Self(resolvers)
    }

    fn shape(&self, field: &OutputFieldConfig) -> ValueShape {
        ValueShape {
            type_param: field.type_param.clone(),
            abstract_type: self.0.get(field.type_param.base().name()).cloned(),
        }
    }
}

/// How a resolved value is handed back to the engine.
#[derive(Clone)]
struct ValueShape {
    type_param: TypeParam,
    abstract_type: Option<Arc<TypeResolver>>,
}

impl ValueShape {
    fn to_field_value<'a>(&self, value: Value) -> Result<Option<FieldValue<'a>>, GraphQLError> {
        if matches!(value, Value::Null) {
            return Ok(None);
        }
        match &self.abstract_type {
            None => Ok(Some(FieldValue::value(value))),
            Some(resolver) => tag(value, &self.type_param, resolver).map(Some),
        }
    }
}

/// Tags abstract values with their concrete type, descending into lists.
fn tag<'a>(
    value: Value,
    type_param: &TypeParam,
    resolver: &TypeResolver,
) -> Result<FieldValue<'a>, GraphQLError> {
    match (type_param, value) {
        (_, Value::Null) => Ok(FieldValue::NULL),
        (TypeParam::List(item), Value::List(items)) => {
            let items = items
                .into_iter()
                .map(|v| tag(v, item, resolver))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FieldValue::list(items))
        }
        (TypeParam::List(_), _) => Err(GraphQLError::new(format!(
            "Expected a list of {} values",
            resolver.name
        ))),
        (TypeParam::Named(_), value) => {
            let concrete = resolver.resolve(&value)?;
            Ok(FieldValue::value(value).with_type(concrete))
        }
    }
}

fn lower_field(field: &OutputFieldConfig, abstracts: &AbstractTypes) -> Field {
    trace!(field = %field.field_ref(), ty = %field.return_type(), "Lowering field");

    let resolver = field
        .resolver
        .clone()
        .unwrap_or_else(|| property_resolver(field.name()));
    let info = resolve_info(field);
    let shape = abstracts.shape(field);

    let mut lowered = Field::new(
        field.name(),
        lower_type(&field.type_param, &field.nullable),
        move |ctx| {
            let resolver = Arc::clone(&resolver);
            let shape = shape.clone();
            let params = resolve_params(&ctx, &info);
            FieldFuture::new(async move {
                let value = resolver(params).await?;
                shape.to_field_value(value)
            })
        },
    );

    if let Some(description) = &field.description {
        lowered = lowered.description(description);
    }
    if let Some(reason) = &field.deprecation_reason {
        lowered = lowered.deprecation(Some(reason.as_str()));
    }
    for arg in field.args.values() {
        lowered = lowered.argument(lower_input_value(arg));
    }
    for directive in directives(&field.extensions) {
        lowered = lowered.directive(directive);
    }
    lowered
}

fn lower_object(ir: &SchemaIr, config: &TypeConfig, abstracts: &AbstractTypes) -> Object {
    let mut object = Object::new(config.name());
    if let Some(description) = &config.description {
        object = object.description(description);
    }
    for interface in &config.interfaces {
        object = object.implement(interface.name());
    }
    for directive in directives(&config.extensions) {
        object = object.directive(directive);
    }
    for field in ir.fields.get(config.name()).into_iter().flat_map(|f| f.values()) {
        object = object.field(lower_field(field, abstracts));
    }
    object
}

fn lower_interface(ir: &SchemaIr, config: &TypeConfig) -> Interface {
    let mut interface = Interface::new(config.name());
    if let Some(description) = &config.description {
        interface = interface.description(description);
    }
    for parent in &config.interfaces {
        interface = interface.implement(parent.name());
    }
    for directive in directives(&config.extensions) {
        interface = interface.directive(directive);
    }
    for field in ir.fields.get(config.name()).into_iter().flat_map(|f| f.values()) {
        let mut lowered =
            InterfaceField::new(field.name(), lower_type(&field.type_param, &field.nullable));
        if let Some(description) = &field.description {
            lowered = lowered.description(description);
        }
        for arg in field.args.values() {
            lowered = lowered.argument(lower_input_value(arg));
        }
        for directive in directives(&field.extensions) {
            lowered = lowered.directive(directive);
        }
        interface = interface.field(lowered);
    }
    interface
}

fn lower_union(config: &TypeConfig) -> Union {
    let mut union = Union::new(config.name());
    if let Some(description) = &config.description {
        union = union.description(description);
    }
    for member in &config.members {
        union = union.possible_type(member.name());
    }
    for directive in directives(&config.extensions) {
        union = union.directive(directive);
    }
    union
}

fn lower_enum(ir: &SchemaIr, config: &TypeConfig) -> Enum {
    let mut lowered = Enum::new(config.name());
    if let Some(description) = &config.description {
        lowered = lowered.description(description);
    }
    for directive in directives(&config.extensions) {
        lowered = lowered.directive(directive);
    }
    for value in ir.enum_values.get(config.name()).into_iter().flat_map(|v| v.values()) {
        let mut item = EnumItem::new(value.name());
        if let Some(description) = &value.description {
            item = item.description(description);
        }
        if let Some(reason) = &value.deprecation_reason {
            item = item.deprecation(Some(reason.as_str()));
        }
        for directive in directives(&value.extensions) {
            item = item.directive(directive);
        }
        lowered = lowered.item(item);
    }
    lowered
}

fn lower_scalar(config: &TypeConfig) -> Scalar {
    let mut scalar = Scalar::new(config.name());
    if let Some(description) = &config.description {
        scalar = scalar.description(description);
    }
    if let Some(url) = &config.specified_by_url {
        scalar = scalar.specified_by_url(url);
    }
    if let Some(validator) = &config.validator {
        let validator = Arc::clone(validator);
        scalar = scalar.validator(move |value| validator(value));
    }
    for directive in directives(&config.extensions) {
        scalar = scalar.directive(directive);
    }
    scalar
}

fn lower_input_object(ir: &SchemaIr, config: &TypeConfig) -> InputObject {
    let mut input = InputObject::new(config.name());
    if let Some(description) = &config.description {
        input = input.description(description);
    }
    for directive in directives(&config.extensions) {
        input = input.directive(directive);
    }
    for field in ir.input_fields.get(config.name()).into_iter().flat_map(|f| f.values()) {
        input = input.field(lower_input_value(field));
    }
    input
}

/// Lowers the subscription root. Each event from the subscriber is passed to
/// the field's resolver as the parent value.
///
/// The engine takes no directives on subscription types or fields.
fn lower_subscription(
    ir: &SchemaIr,
    config: &TypeConfig,
    abstracts: &AbstractTypes,
) -> Subscription {
    let mut subscription = Subscription::new(config.name());
    if let Some(description) = &config.description {
        subscription = subscription.description(description);
    }

    for field in ir.fields.get(config.name()).into_iter().flat_map(|f| f.values()) {
        trace!(
            field = %field.field_ref(),
            ty = %field.return_type(),
            "Lowering subscription field"
        );

        let subscriber = field.subscriber.clone();
        let resolver = field.resolver.clone().unwrap_or_else(identity_resolver);
        let info = resolve_info(field);
        let shape = abstracts.shape(field);

        let mut lowered = SubscriptionField::new(
            field.name(),
            lower_type(&field.type_param, &field.nullable),
            move |ctx| {
                let subscriber = subscriber.clone();
                let resolver = Arc::clone(&resolver);
                let shape = shape.clone();
                let params = resolve_params(&ctx, &info);

                SubscriptionFieldFuture::new(async move {
                    let subscriber = subscriber.ok_or_else(|| {
                        GraphQLError::new("Subscription field has no subscribe function")
                    })?;
                    let events = subscriber(params.clone()).await?;

                    let stream = events.then(move |event| {
                        let resolver = Arc::clone(&resolver);
                        let shape = shape.clone();
                        let mut params = params.clone();
                        async move {
                            params.parent = event?;
                            let value = resolver(params).await?;
                            let value =
                                shape.to_field_value(value)?.unwrap_or(FieldValue::NULL);
                            Ok::<_, GraphQLError>(value)
                        }
                    });
                    Ok::<_, GraphQLError>(stream)
                })
            },
        );

        if let Some(description) = &field.description {
            lowered = lowered.description(description);
        }
        for arg in field.args.values() {
            lowered = lowered.argument(lower_input_value(arg));
        }
        subscription = subscription.field(lowered);
    }

    subscription
}
