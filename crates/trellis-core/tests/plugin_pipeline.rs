//! Integration tests for plugin hooks as seen through the builder.

use std::sync::{Arc, Mutex};

use async_graphql::Value;
use async_graphql::dynamic::Schema;
use serde_json::json;
use trellis_core::{
    BuildOptions, EnumTypeOptions, FieldOptions, HookContext, HookPhase, InputFieldConfig,
    InputFieldOptions, InterfaceTypeOptions, ObjectTypeOptions, OutputFieldConfig, Plugin,
    PluginError, PluginRegistry, Resolver, SchemaBuilder, SchemaBuilderConfig, SchemaError,
    SchemaIr, TypeConfig, TypeKind, TypeRef,
};

// =============================================================================
// Test plugins
// =============================================================================

type Log = Arc<Mutex<Vec<String>>>;

/// Appends its name to `extensions["seenBy"]` on every type and field.
struct Marker(&'static str);

impl Marker {
    fn mark(&self, extensions: &mut trellis_core::Extensions) {
        let seen = extensions.entry("seenBy".into()).or_insert_with(|| json!([]));
        if let Some(list) = seen.as_array_mut() {
            list.push(json!(self.0));
        }
    }
}

impl Plugin for Marker {
    fn on_type_config(
        &self,
        mut config: TypeConfig,
        _cx: &HookContext<'_>,
    ) -> Result<TypeConfig, PluginError> {
        self.mark(&mut config.extensions);
        Ok(config)
    }

    fn on_output_field_config(
        &self,
        mut config: OutputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<OutputFieldConfig, PluginError> {
        self.mark(&mut config.extensions);
        Ok(config)
    }

    fn on_input_field_config(
        &self,
        mut config: InputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<InputFieldConfig, PluginError> {
        self.mark(&mut config.extensions);
        Ok(config)
    }
}

/// Records resolver calls around the wrapped resolver.
struct Tracer {
    name: &'static str,
    log: Log,
}

impl Plugin for Tracer {
    fn wrap_resolve(
        &self,
        inner: Resolver,
        field: &OutputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<Resolver, PluginError> {
        if field.name() != "greeting" {
            return Ok(inner);
        }
        let name = self.name;
        let log = Arc::clone(&self.log);
        Ok(Arc::new(move |params| {
            let inner = Arc::clone(&inner);
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().unwrap().push(format!("{name}-before"));
                let result = inner(params).await;
                log.lock().unwrap().push(format!("{name}-after"));
                result
            })
        }))
    }
}

/// Fails (or panics) in one phase.
struct Failing {
    phase: HookPhase,
    panic: bool,
}

impl Failing {
    fn fail<T>(&self, phase: HookPhase, ok: T) -> Result<T, PluginError> {
        if phase != self.phase {
            return Ok(ok);
        }
        if self.panic {
            panic!("boom in {phase}");
        }
        Err(PluginError::hook(format!("refused in {phase}")))
    }
}

impl Plugin for Failing {
    fn on_type_config(
        &self,
        config: TypeConfig,
        _cx: &HookContext<'_>,
    ) -> Result<TypeConfig, PluginError> {
        self.fail(HookPhase::TypeConfig, config)
    }

    fn on_output_field_config(
        &self,
        config: OutputFieldConfig,
        _cx: &HookContext<'_>,
    ) -> Result<OutputFieldConfig, PluginError> {
        self.fail(HookPhase::OutputFieldConfig, config)
    }

    fn on_schema_build(
        &self,
        ir: SchemaIr,
        _config: &SchemaBuilderConfig,
    ) -> Result<SchemaIr, PluginError> {
        self.fail(HookPhase::SchemaBuild, ir)
    }

    fn after_build(
        &self,
        schema: Schema,
        _config: &SchemaBuilderConfig,
    ) -> Result<Schema, PluginError> {
        self.fail(HookPhase::AfterBuild, schema)
    }
}

/// Adds a `version` field to the query root during `on_schema_build`.
struct Versioned;

impl Plugin for Versioned {
    fn on_schema_build(
        &self,
        mut ir: SchemaIr,
        _config: &SchemaBuilderConfig,
    ) -> Result<SchemaIr, PluginError> {
        let query = ir.roots.query.clone().ok_or_else(|| PluginError::hook("no query root"))?;
        let mut field = OutputFieldConfig::new(
            query.as_str(),
            "version",
            trellis_core::FieldKind::Query,
            TypeRef::string().into(),
        );
        field.resolver = Some(trellis_core::resolver(|_| async { Ok(Value::from("1.0")) }));
        ir.fields.entry(query).or_default().insert("version".into(), field);
        Ok(ir)
    }
}

/// Makes every object other than the roots implement `Node`.
struct Nodeify;

impl Plugin for Nodeify {
    fn on_type_config(
        &self,
        mut config: TypeConfig,
        _cx: &HookContext<'_>,
    ) -> Result<TypeConfig, PluginError> {
        if config.kind() == TypeKind::Object && config.name() != "Query" {
            config.interfaces.push(TypeRef::interface("Node"));
        }
        Ok(config)
    }
}

/// Drops `User.id` after the element hooks ran.
struct DropId;

impl Plugin for DropId {
    fn on_schema_build(
        &self,
        mut ir: SchemaIr,
        _config: &SchemaBuilderConfig,
    ) -> Result<SchemaIr, PluginError> {
        if let Some(fields) = ir.fields.get_mut("User") {
            fields.shift_remove("id");
        }
        Ok(ir)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

fn registry(log: &Log) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register("p1", |_| Ok(Arc::new(Marker("P1")) as Arc<dyn Plugin>)).unwrap();
    registry.register("p2", |_| Ok(Arc::new(Marker("P2")) as Arc<dyn Plugin>)).unwrap();

    let a = Arc::clone(log);
    registry
        .register("a", move |_| {
            Ok(Arc::new(Tracer { name: "a", log: Arc::clone(&a) }) as Arc<dyn Plugin>)
        })
        .unwrap();
    let b = Arc::clone(log);
    registry
        .register("b", move |_| {
            Ok(Arc::new(Tracer { name: "b", log: Arc::clone(&b) }) as Arc<dyn Plugin>)
        })
        .unwrap();

    registry.register("versioned", |_| Ok(Arc::new(Versioned) as Arc<dyn Plugin>)).unwrap();
    registry
}

fn declare(builder: &mut SchemaBuilder, log: &Log) {
    builder
        .enum_type("Mood", EnumTypeOptions::with_values(["HAPPY", "GRUMPY"]))
        .unwrap();
    let base_log = Arc::clone(log);
    builder
        .query_type(ObjectTypeOptions::new().fields(move |t| {
            let log = Arc::clone(&base_log);
            t.field(
                "greeting",
                FieldOptions::new(TypeRef::string())
                    .arg("name", InputFieldOptions::string())
                    .resolve(move |params| {
                        let log = Arc::clone(&log);
                        async move {
                            log.lock().unwrap().push("base".into());
                            let name = params.arg_str("name").unwrap_or("world").to_string();
                            Ok(Value::from(format!("hello {name}")))
                        }
                    }),
            );
        }))
        .unwrap();
}

fn build_with(plugins: &[&str], log: &Log) -> Result<SchemaBuilder, SchemaError> {
    let config = SchemaBuilderConfig::default().with_plugins(plugins.iter().copied());
    let mut builder = SchemaBuilder::new(&registry(log), config)?;
    declare(&mut builder, log);
    Ok(builder)
}

fn node_builder(plugins: &[&str]) -> SchemaBuilder {
    let mut registry = PluginRegistry::new();
    registry.register("nodeify", |_| Ok(Arc::new(Nodeify) as Arc<dyn Plugin>)).unwrap();
    registry.register("drop_id", |_| Ok(Arc::new(DropId) as Arc<dyn Plugin>)).unwrap();
    let config = SchemaBuilderConfig::default().with_plugins(plugins.iter().copied());
    let mut builder = SchemaBuilder::new(&registry, config).unwrap();

    builder
        .interface_type(
            "Node",
            InterfaceTypeOptions::new().fields(|t| {
                t.expose_id("id");
            }),
        )
        .unwrap();
    builder
        .object_type(
            "User",
            ObjectTypeOptions::new().fields(|t| {
                t.expose_string("name");
            }),
        )
        .unwrap();
    builder
        .query_type(ObjectTypeOptions::new().fields(|t| {
            t.field(
                "user",
                FieldOptions::new(TypeRef::object("User")).resolve(|_| async {
                    Ok(Value::from_json(json!({ "id": "u1", "name": "Ada" })).unwrap())
                }),
            );
        }))
        .unwrap();
    builder
}

fn failing(phase: HookPhase, panic: bool) -> SchemaBuilder {
    let mut registry = PluginRegistry::new();
    registry
        .register("failing", move |_| Ok(Arc::new(Failing { phase, panic }) as Arc<dyn Plugin>))
        .unwrap();
    let config = SchemaBuilderConfig::default().with_plugins(["failing"]);
    let mut builder = SchemaBuilder::new(&registry, config).unwrap();
    declare(&mut builder, &Log::default());
    builder
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_hooks_fold_in_configured_order() {
    let log = Log::default();
    let ir = build_with(&["p1", "p2"], &log).unwrap().build_ir().unwrap();

    assert_eq!(ir.types["Query"].extensions["seenBy"], json!(["P1", "P2"]));
    assert_eq!(ir.types["Mood"].extensions["seenBy"], json!(["P1", "P2"]));

    let greeting = &ir.fields["Query"]["greeting"];
    assert_eq!(greeting.extensions["seenBy"], json!(["P1", "P2"]));
    assert_eq!(greeting.args["name"].extensions["seenBy"], json!(["P1", "P2"]));
}

#[test]
fn test_reversed_configuration_reverses_fold() {
    let log = Log::default();
    let ir = build_with(&["p2", "p1"], &log).unwrap().build_ir().unwrap();
    assert_eq!(ir.types["Query"].extensions["seenBy"], json!(["P2", "P1"]));
}

#[test]
fn test_no_plugins_leaves_configs_untouched() {
    let log = Log::default();
    let ir = build_with(&[], &log).unwrap().build_ir().unwrap();
    assert!(ir.types["Query"].extensions.is_empty());
}

#[tokio::test]
async fn test_last_plugin_wraps_outermost() {
    let log = Log::default();
    let schema = build_with(&["a", "b"], &log)
        .unwrap()
        .to_schema(BuildOptions::new())
        .unwrap();

    let response = schema.execute(r#"{ greeting(name: "trellis") }"#).await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
    assert_eq!(response.data.into_json().unwrap(), json!({ "greeting": "hello trellis" }));

    assert_eq!(
        *log.lock().unwrap(),
        ["b-before", "a-before", "base", "a-after", "b-after"]
    );
}

#[tokio::test]
async fn test_schema_build_hook_adds_field() {
    let log = Log::default();
    let schema = build_with(&["versioned"], &log)
        .unwrap()
        .to_schema(BuildOptions::new())
        .unwrap();

    assert!(schema.sdl().contains("version: String!"));
    let response = schema.execute("{ version }").await;
    assert_eq!(response.data.into_json().unwrap(), json!({ "version": "1.0" }));
}

#[test]
fn test_hook_error_is_attributed() {
    init_tracing();
    let err = failing(HookPhase::OutputFieldConfig, false)
        .to_schema(BuildOptions::new())
        .unwrap_err();

    assert_eq!(err.hook_origin(), Some(("failing", HookPhase::OutputFieldConfig)));
    assert!(err.to_string().contains("refused in on_output_field_config"), "{err}");
}

#[test]
fn test_hook_panic_is_attributed() {
    init_tracing();
    let err = failing(HookPhase::TypeConfig, true)
        .to_schema(BuildOptions::new())
        .unwrap_err();

    assert_eq!(err.hook_origin(), Some(("failing", HookPhase::TypeConfig)));
    assert!(
        matches!(
            err,
            SchemaError::PluginHook { source: PluginError::Panicked(ref msg), .. }
                if msg.contains("boom")
        ),
        "{err}"
    );
}

#[test]
fn test_whole_schema_phases_are_attributed() {
    init_tracing();
    for phase in [HookPhase::SchemaBuild, HookPhase::AfterBuild] {
        let err = failing(phase, false).to_schema(BuildOptions::new()).unwrap_err();
        assert_eq!(err.hook_origin(), Some(("failing", phase)));
    }
}

#[test]
fn test_plugins_instantiated_per_builder() {
    let log = Log::default();
    let first = build_with(&["p1", "p1", "p2"], &log).unwrap();
    assert_eq!(first.plugin_names(), ["p1", "p2"]);

    let second = build_with(&["p2"], &log).unwrap();
    assert_eq!(second.plugin_names(), ["p2"]);
}

#[tokio::test]
async fn test_interface_added_by_type_hook_is_inherited() {
    let builder = node_builder(&["nodeify"]);
    let ir = builder.build_ir().unwrap();
    let names: Vec<_> = ir.fields["User"].keys().map(String::as_str).collect();
    assert_eq!(names, ["id", "name"]);
    assert_eq!(ir.fields["User"]["id"].parent_type(), "User");

    let schema = builder.to_schema(BuildOptions::new()).unwrap();
    assert!(schema.sdl().contains("type User implements Node"));

    let response = schema.execute("{ user { id name } }").await;
    assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "user": { "id": "u1", "name": "Ada" } })
    );
}

#[test]
fn test_schema_build_dropping_interface_field_is_inconsistent() {
    let err = node_builder(&["nodeify", "drop_id"]).build_ir().unwrap_err();
    assert!(
        matches!(
            err,
            SchemaError::InconsistentConfig(ref msg)
                if msg.contains("missing field 'id' of interface 'Node'")
        ),
        "{err}"
    );
}
