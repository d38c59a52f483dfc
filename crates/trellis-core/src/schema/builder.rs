//! Schema builder facade.
//!
//! Applications declare types through [`SchemaBuilder`]; every declaration
//! returns a ref immediately and lands in the config store. Nothing is
//! transformed until [`SchemaBuilder::to_schema`] runs the plugin pipeline and
//! compiles the result.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::compile::compile;
use super::fields::{FieldBuilder, InputFieldBuilder};
use super::options::{
    EnumTypeOptions, InputObjectTypeOptions, InterfaceTypeOptions, ObjectTypeOptions,
    ScalarTypeOptions, UnionTypeOptions,
};
use super::store::ConfigStore;
use super::validate;
use crate::config::{BuildOptions, EngineLimits, SchemaBuilderConfig};
use crate::error::SchemaError;
use crate::ir::{SchemaIr, TypeConfig};
use crate::plugin::{Pipeline, PluginRegistry};
use crate::refs::{TypeKind, TypeRef};

/// Reserved name of the query root.
pub const QUERY_TYPE: &str = "Query";
/// Reserved name of the mutation root.
pub const MUTATION_TYPE: &str = "Mutation";
/// Reserved name of the subscription root.
pub const SUBSCRIPTION_TYPE: &str = "Subscription";

/// Something a type can be declared by: a name, or a ref from a forward
/// declaration.
pub trait TypeName {
    /// The type name and, for refs, the kind the ref was declared with.
    fn into_type_name(self) -> (Arc<str>, Option<TypeKind>);
}

impl TypeName for &str {
    fn into_type_name(self) -> (Arc<str>, Option<TypeKind>) {
        (self.into(), None)
    }
}

impl TypeName for String {
    fn into_type_name(self) -> (Arc<str>, Option<TypeKind>) {
        (self.into(), None)
    }
}

impl TypeName for &TypeRef {
    fn into_type_name(self) -> (Arc<str>, Option<TypeKind>) {
        (self.name().into(), Some(self.kind()))
    }
}

impl TypeName for TypeRef {
    fn into_type_name(self) -> (Arc<str>, Option<TypeKind>) {
        (&self).into_type_name()
    }
}

/// Declarative schema builder.
///
/// # Example
///
/// ```ignore
/// let mut registry = PluginRegistry::new();
/// trellis_plugins::register_all(&mut registry)?;
///
/// let mut builder = SchemaBuilder::new(
///     &registry,
///     SchemaBuilderConfig::default().with_plugins(["directives"]),
/// )?;
///
/// let post = builder.object_ref("Post");
/// let user = builder.object_type(
///     "User",
///     ObjectTypeOptions::new().fields(move |t| {
///         t.expose_id("id");
///         t.field("posts", FieldOptions::list(TypeRef::object("Post")));
///     }),
/// )?;
/// builder.object_type(&post, ObjectTypeOptions::new().fields(move |t| {
///     t.expose_id("id");
///     t.field("author", FieldOptions::new(TypeRef::object("User")));
/// }))?;
/// builder.query_type(ObjectTypeOptions::new().fields(|t| {
///     t.field("me", FieldOptions::new(TypeRef::object("User")).resolve(load_me));
/// }))?;
///
/// let schema = builder.to_schema(BuildOptions::new())?;
/// ```
pub struct SchemaBuilder {
    config: SchemaBuilderConfig,
    pipeline: Pipeline,
    store: ConfigStore,
}

impl SchemaBuilder {
    /// Creates a builder, instantiating the configured plugins once.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidConfig` for invalid configuration,
    /// `SchemaError::UnknownPlugin` for unregistered plugin names, and
    /// `SchemaError::PluginHook` if a plugin fails to construct.
    pub fn new(
        registry: &PluginRegistry,
        config: SchemaBuilderConfig,
    ) -> Result<Self, SchemaError> {
        config.validate().map_err(SchemaError::InvalidConfig)?;
        let pipeline = Pipeline::new(registry.instantiate(&config)?);

        debug!(plugins = ?pipeline.plugin_names(), "Created schema builder");
        Ok(Self {
            config,
            pipeline,
            store: ConfigStore::default(),
        })
    }

    /// The configuration the builder was created with.
    #[must_use]
    pub fn options(&self) -> &SchemaBuilderConfig {
        &self.config
    }

    /// Names of the instantiated plugins, in hook order.
    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        self.pipeline.plugin_names()
    }

    /// Looks up a declared type's config.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnresolvedReference` if the type is not
    /// implemented (built-in scalars have no config), or
    /// `SchemaError::RefKindMismatch` if it has another kind.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<&TypeConfig, SchemaError> {
        self.store.resolve(type_ref)
    }

    // Forward declarations

    /// Declares an object ref to be implemented later with [`object_type`](Self::object_type).
    pub fn object_ref(&mut self, name: &str) -> TypeRef {
        self.store.declare(TypeRef::object(name))
    }

    pub fn interface_ref(&mut self, name: &str) -> TypeRef {
        self.store.declare(TypeRef::interface(name))
    }

    pub fn union_ref(&mut self, name: &str) -> TypeRef {
        self.store.declare(TypeRef::union(name))
    }

    pub fn enum_ref(&mut self, name: &str) -> TypeRef {
        self.store.declare(TypeRef::enumeration(name))
    }

    pub fn scalar_ref(&mut self, name: &str) -> TypeRef {
        self.store.declare(TypeRef::scalar(name))
    }

    pub fn input_ref(&mut self, name: &str) -> TypeRef {
        self.store.declare(TypeRef::input(name))
    }

    // Type declarations

    fn type_name(target: impl TypeName, kind: TypeKind) -> Result<Arc<str>, SchemaError> {
        let (name, declared) = target.into_type_name();
        match declared {
            Some(declared) if declared != kind => Err(SchemaError::RefKindMismatch {
                reference: TypeRef::new(declared, name).to_string(),
                actual: kind.to_string(),
            }),
            _ => Ok(name),
        }
    }

    /// Declares an object type.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateTypeName` if the name is taken; the
    /// builder then refuses to build.
    pub fn object_type(
        &mut self,
        name: impl TypeName,
        options: ObjectTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let name = Self::type_name(name, TypeKind::Object)?;
        let (config, fields) = options.into_parts(name);
        let type_ref = self.store.register_type(config)?;
        if let Some(fields) = fields {
            self.store.add_fields(type_ref.name(), fields);
        }
        Ok(type_ref)
    }

    pub fn interface_type(
        &mut self,
        name: impl TypeName,
        options: InterfaceTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let name = Self::type_name(name, TypeKind::Interface)?;
        let (config, fields) = options.into_parts(name);
        let type_ref = self.store.register_type(config)?;
        if let Some(fields) = fields {
            self.store.add_fields(type_ref.name(), fields);
        }
        Ok(type_ref)
    }

    pub fn union_type(
        &mut self,
        name: impl TypeName,
        options: UnionTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let name = Self::type_name(name, TypeKind::Union)?;
        self.store.register_type(options.into_config(name))
    }

    /// Declares an enum type with its values.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateFieldName` for a repeated value and
    /// `SchemaError::DuplicateTypeName` if the name is taken.
    pub fn enum_type(
        &mut self,
        name: impl TypeName,
        options: EnumTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let name = Self::type_name(name, TypeKind::Enum)?;
        let (config, values) = options
            .into_parts(Arc::clone(&name))
            .map_err(|value| SchemaError::duplicate_field(&*name, value))?;
        let type_ref = self.store.register_type(config)?;
        self.store.register_enum_values(type_ref.name(), values);
        Ok(type_ref)
    }

    pub fn scalar_type(
        &mut self,
        name: impl TypeName,
        options: ScalarTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let name = Self::type_name(name, TypeKind::Scalar)?;
        self.store.register_type(options.into_config(name))
    }

    pub fn input_type(
        &mut self,
        name: impl TypeName,
        options: InputObjectTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let name = Self::type_name(name, TypeKind::InputObject)?;
        let (config, fields) = options.into_parts(name);
        let type_ref = self.store.register_type(config)?;
        if let Some(fields) = fields {
            self.store.add_input_fields(type_ref.name(), fields);
        }
        Ok(type_ref)
    }

    /// Declares the `Query` root.
    pub fn query_type(&mut self, options: ObjectTypeOptions) -> Result<TypeRef, SchemaError> {
        let type_ref = self.object_type(QUERY_TYPE, options)?;
        self.store.roots.query = Some(QUERY_TYPE.to_string());
        Ok(type_ref)
    }

    /// Declares the `Mutation` root.
    pub fn mutation_type(&mut self, options: ObjectTypeOptions) -> Result<TypeRef, SchemaError> {
        let type_ref = self.object_type(MUTATION_TYPE, options)?;
        self.store.roots.mutation = Some(MUTATION_TYPE.to_string());
        Ok(type_ref)
    }

    /// Declares the `Subscription` root. Its fields need a subscribe
    /// function; see [`FieldOptions::subscribe`](super::FieldOptions::subscribe).
    pub fn subscription_type(
        &mut self,
        options: ObjectTypeOptions,
    ) -> Result<TypeRef, SchemaError> {
        let type_ref = self.object_type(SUBSCRIPTION_TYPE, options)?;
        self.store.roots.subscription = Some(SUBSCRIPTION_TYPE.to_string());
        Ok(type_ref)
    }

    // Additional field blocks

    fn add_fields(
        &mut self,
        type_ref: &TypeRef,
        fields: impl Fn(&mut FieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        if !matches!(type_ref.kind(), TypeKind::Object | TypeKind::Interface) {
            return Err(SchemaError::InvalidTypeUsage {
                reference: type_ref.to_string(),
                usage: "a type with output fields".into(),
            });
        }
        let type_ref = self.store.declare(type_ref.clone());
        self.store.add_fields(type_ref.name(), Arc::new(fields));
        Ok(())
    }

    /// Adds fields to an object type, declared before or after this call.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidTypeUsage` if `type_ref` is not an object ref.
    pub fn object_fields(
        &mut self,
        type_ref: &TypeRef,
        fields: impl Fn(&mut FieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        if type_ref.kind() != TypeKind::Object {
            return Err(SchemaError::InvalidTypeUsage {
                reference: type_ref.to_string(),
                usage: "an object type".into(),
            });
        }
        self.add_fields(type_ref, fields)
    }

    pub fn interface_fields(
        &mut self,
        type_ref: &TypeRef,
        fields: impl Fn(&mut FieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        if type_ref.kind() != TypeKind::Interface {
            return Err(SchemaError::InvalidTypeUsage {
                reference: type_ref.to_string(),
                usage: "an interface type".into(),
            });
        }
        self.add_fields(type_ref, fields)
    }

    pub fn query_fields(
        &mut self,
        fields: impl Fn(&mut FieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        self.add_fields(&TypeRef::object(QUERY_TYPE), fields)
    }

    pub fn mutation_fields(
        &mut self,
        fields: impl Fn(&mut FieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        self.add_fields(&TypeRef::object(MUTATION_TYPE), fields)
    }

    pub fn subscription_fields(
        &mut self,
        fields: impl Fn(&mut FieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        self.add_fields(&TypeRef::object(SUBSCRIPTION_TYPE), fields)
    }

    /// Adds fields to an input object type.
    pub fn input_fields(
        &mut self,
        type_ref: &TypeRef,
        fields: impl Fn(&mut InputFieldBuilder) + Send + Sync + 'static,
    ) -> Result<(), SchemaError> {
        if type_ref.kind() != TypeKind::InputObject {
            return Err(SchemaError::InvalidTypeUsage {
                reference: type_ref.to_string(),
                usage: "an input object type".into(),
            });
        }
        let type_ref = self.store.declare(type_ref.clone());
        self.store.add_input_fields(type_ref.name(), Arc::new(fields));
        Ok(())
    }

    // Build

    /// Runs every declaration and hook and returns the final IR, without
    /// compiling it.
    ///
    /// # Errors
    ///
    /// Fails on the first duplicate, unresolved, or misused reference, or the
    /// first failing plugin hook.
    pub fn build_ir(&self) -> Result<SchemaIr, SchemaError> {
        self.store.check_poisoned()?;

        let mut ir = self.store.collect()?;
        validate::check_declared(&ir, self.store.declared())?;
        validate::check_refs(&ir)?;

        self.pipeline.run_element_hooks(&mut ir, &self.config)?;
        let ir = self.pipeline.run_schema_build(ir, &self.config)?;

        validate::check_consistency(&ir)?;
        validate::check_refs(&ir)?;
        Ok(ir)
    }

    /// Runs the pipeline and compiles the schema.
    ///
    /// Calling this twice without new declarations yields structurally
    /// equal schemas, unless a plugin keeps state of its own.
    ///
    /// # Errors
    ///
    /// Everything [`build_ir`](Self::build_ir) reports, plus
    /// `SchemaError::Compile` if the engine rejects the schema and
    /// `SchemaError::PluginHook` from `after_build`.
    pub fn to_schema(&self, options: BuildOptions) -> Result<Schema, SchemaError> {
        debug!(
            types = self.store.len(),
            plugins = ?self.pipeline.plugin_names(),
            "Starting schema build"
        );

        let ir = self.build_ir()?;
        let limits = EngineLimits::resolve(&self.config, &options);
        let schema = compile(&ir, limits, options.schema_data())?;
        let schema = self.pipeline.run_after_build(schema, &self.config)?;

        info!(
            types = ir.types.len(),
            fields = ir.fields.values().map(IndexMap::len).sum::<usize>(),
            "Schema build complete"
        );
        Ok(schema)
    }
}

impl std::fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("plugins", &self.pipeline.plugin_names())
            .field("types", &self.store.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldOptions;

    fn builder() -> SchemaBuilder {
        SchemaBuilder::new(&PluginRegistry::new(), SchemaBuilderConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SchemaBuilderConfig {
            max_depth: Some(0),
            ..Default::default()
        };
        let err = SchemaBuilder::new(&PluginRegistry::new(), config).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        let config = SchemaBuilderConfig::default().with_plugins(["missing"]);
        let err = SchemaBuilder::new(&PluginRegistry::new(), config).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownPlugin { .. }));
    }

    #[test]
    fn test_declarations_return_refs() {
        let mut builder = builder();
        let user = builder.object_type("User", ObjectTypeOptions::new()).unwrap();
        let role = builder
            .enum_type("Role", EnumTypeOptions::with_values(["ADMIN"]))
            .unwrap();
        let query = builder.query_type(ObjectTypeOptions::new()).unwrap();

        assert_eq!(user.to_string(), "ObjectRef<User>");
        assert_eq!(role.to_string(), "EnumRef<Role>");
        assert_eq!(query.name(), QUERY_TYPE);
        assert_eq!(builder.resolve(&user).unwrap().kind(), TypeKind::Object);
    }

    #[test]
    fn test_ref_kind_must_match_declaration() {
        let mut builder = builder();
        let node = builder.interface_ref("Node");
        let err = builder.object_type(&node, ObjectTypeOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::RefKindMismatch { ref reference, .. } if reference == "InterfaceRef<Node>"
        ));
    }

    #[test]
    fn test_duplicate_type_poisons_builder() {
        let mut builder = builder();
        builder.query_type(ObjectTypeOptions::new().fields(|t| {
            t.expose_string("hello");
        }))
        .unwrap();
        builder.object_type("User", ObjectTypeOptions::new()).unwrap();

        let err = builder.union_type("User", UnionTypeOptions::new()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTypeName { .. }));

        let err = builder.build_ir().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTypeName { ref name } if name == "User"));
    }

    #[test]
    fn test_duplicate_enum_value() {
        let mut builder = builder();
        let err = builder
            .enum_type("Role", EnumTypeOptions::with_values(["ADMIN", "ADMIN"]))
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateFieldName { ref parent, ref field }
                if parent == "Role" && field == "ADMIN"
        ));
    }

    #[test]
    fn test_field_blocks_on_wrong_kind() {
        let mut builder = builder();
        let role = builder.enum_ref("Role");
        assert!(matches!(
            builder.object_fields(&role, |_| {}),
            Err(SchemaError::InvalidTypeUsage { .. })
        ));
    }

    #[test]
    fn test_unimplemented_forward_ref() {
        let mut builder = builder();
        builder.object_ref("Post");
        builder
            .query_type(ObjectTypeOptions::new().fields(|t| {
                t.expose_string("hello");
            }))
            .unwrap();

        let err = builder.build_ir().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnresolvedReference { ref reference } if reference == "ObjectRef<Post>"
        ));
    }

    #[test]
    fn test_field_blocks_append_in_order() {
        let mut builder = builder();
        let user = builder
            .object_type(
                "User",
                ObjectTypeOptions::new().fields(|t| {
                    t.expose_id("id");
                }),
            )
            .unwrap();
        builder
            .object_fields(&user, |t| {
                t.field("nickname", FieldOptions::new(TypeRef::string()).nullable(true));
            })
            .unwrap();
        builder
            .query_fields(|t| {
                t.field("me", FieldOptions::new(TypeRef::object("User")));
            })
            .unwrap();
        builder.query_type(ObjectTypeOptions::new()).unwrap();

        let ir = builder.build_ir().unwrap();
        let names: Vec<_> = ir.fields["User"].keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "nickname"]);
        assert!(ir.fields["Query"].contains_key("me"));
    }
}
