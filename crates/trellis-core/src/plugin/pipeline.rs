//! Hook pipeline.
//!
//! The pipeline owns the builder's plugin instances and runs their hooks over
//! the IR. Each hook is a sequential fold in configured order; hooks run
//! synchronously on the building thread and never concurrently.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use async_graphql::dynamic::Schema;
use tracing::{error, trace, warn};

use super::{HookContext, Plugin, PluginInstance};
use crate::config::SchemaBuilderConfig;
use crate::error::{HookPhase, PluginError, SchemaError};
use crate::ir::{
    EnumValueConfig, FieldKind, InputFieldConfig, OutputFieldConfig, SchemaIr, TypeConfig,
};
use crate::refs::TypeKind;
use crate::resolver::{Resolver, identity_resolver, property_resolver};
use crate::schema::store::inherit_fields;

/// Runs `hook` for `plugin`, turning errors and panics into a
/// [`SchemaError::PluginHook`] attributed to the plugin and phase.
pub(crate) fn guard<T>(
    plugin: &str,
    phase: HookPhase,
    hook: impl FnOnce() -> Result<T, PluginError>,
) -> Result<T, SchemaError> {
    let outcome = match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(plugin = %plugin, phase = %phase, panic = %panic_msg, "Plugin hook panicked");
            Err(PluginError::Panicked(panic_msg))
        }
    };

    outcome.map_err(|source| {
        warn!(plugin = %plugin, phase = %phase, error = %source, "Plugin hook failed");
        SchemaError::plugin_hook(plugin, phase, source)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Identity of an element as hooks must leave it.
trait Identity {
    fn identity(&self) -> String;
}

impl Identity for TypeConfig {
    fn identity(&self) -> String {
        self.type_ref().to_string()
    }
}

impl Identity for OutputFieldConfig {
    fn identity(&self) -> String {
        format!("{} ({})", self.field_ref(), self.kind().as_str())
    }
}

impl Identity for InputFieldConfig {
    fn identity(&self) -> String {
        format!("{} ({:?})", self.input_ref(), self.kind())
    }
}

impl Identity for EnumValueConfig {
    fn identity(&self) -> String {
        format!("EnumValue<{}.{}>", self.parent_type(), self.name())
    }
}

/// Ordered plugin instances of one builder.
#[derive(Debug, Clone, Default)]
pub(crate) struct Pipeline {
    plugins: Vec<PluginInstance>,
}

impl Pipeline {
    pub(crate) fn new(plugins: Vec<PluginInstance>) -> Self {
        Self { plugins }
    }

    pub(crate) fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    /// Folds `config` through every plugin's `hook`, checking after each
    /// plugin that the element kept its identity.
    fn fold<C, H>(&self, mut config: C, phase: HookPhase, hook: H) -> Result<C, SchemaError>
    where
        C: Identity,
        H: Fn(&dyn Plugin, C) -> Result<C, PluginError>,
    {
        for instance in &self.plugins {
            let before = config.identity();
            trace!(plugin = %instance.name, phase = %phase, element = %before, "Running hook");

            config = guard(&instance.name, phase, || hook(instance.plugin.as_ref(), config))?;

            let after = config.identity();
            if after != before {
                let source =
                    PluginError::hook(format!("hook changed identity of {before} to {after}"));
                warn!(
                    plugin = %instance.name,
                    phase = %phase,
                    error = %source,
                    "Plugin hook failed"
                );
                return Err(SchemaError::plugin_hook(&instance.name, phase, source));
            }
        }
        Ok(config)
    }

    /// Runs the per-element hooks over the whole IR.
    ///
    /// Types are visited in declaration order. Right after a type's
    /// `on_type_config` fold, its fields are visited in declaration order:
    /// arguments first, then the field itself, then `wrap_resolve`.
    ///
    /// An object whose `on_type_config` fold adds interfaces inherits their
    /// declared fields before its field hooks run.
    pub(crate) fn run_element_hooks(
        &self,
        ir: &mut SchemaIr,
        config: &SchemaBuilderConfig,
    ) -> Result<(), SchemaError> {
        let names: Vec<String> = ir.types.keys().cloned().collect();
        let declared = ir.fields.clone();

        for name in &names {
            let Some(base) = ir.types.get(name).cloned() else {
                continue;
            };
            let base_interfaces = base.interfaces.clone();

            let folded = {
                let cx = HookContext::new(config, &ir.types);
                self.fold(base, HookPhase::TypeConfig, |plugin, c| plugin.on_type_config(c, &cx))?
            };
            let kind = folded.kind();
            if kind == TypeKind::Object && folded.interfaces != base_interfaces {
                let field_kind = ir.roots.field_kind(name, kind);
                let own = ir.fields.get(name).cloned().unwrap_or_default();
                let merged = inherit_fields(&declared, name, field_kind, &folded.interfaces, own);
                ir.fields.insert(name.clone(), merged);
            }
            ir.types.insert(name.clone(), folded);

            let cx = HookContext::new(config, &ir.types);
            match kind {
                TypeKind::Object | TypeKind::Interface => {
                    if let Some(fields) = ir.fields.get_mut(name) {
                        for field in fields.values_mut() {
                            *field = self.run_output_field(field.clone(), &cx)?;
                        }
                    }
                }
                TypeKind::InputObject => {
                    if let Some(fields) = ir.input_fields.get_mut(name) {
                        for field in fields.values_mut() {
                            *field = self.run_input_field(field.clone(), &cx)?;
                        }
                    }
                }
                TypeKind::Enum => {
                    if let Some(values) = ir.enum_values.get_mut(name) {
                        for value in values.values_mut() {
                            *value = self.fold(
                                value.clone(),
                                HookPhase::EnumValueConfig,
                                |plugin, c| plugin.on_enum_value_config(c, &cx),
                            )?;
                        }
                    }
                }
                TypeKind::Union | TypeKind::Scalar => {}
            }
        }

        Ok(())
    }

    fn run_input_field(
        &self,
        field: InputFieldConfig,
        cx: &HookContext<'_>,
    ) -> Result<InputFieldConfig, SchemaError> {
        self.fold(field, HookPhase::InputFieldConfig, |plugin, c| {
            plugin.on_input_field_config(c, cx)
        })
    }

    fn run_output_field(
        &self,
        mut field: OutputFieldConfig,
        cx: &HookContext<'_>,
    ) -> Result<OutputFieldConfig, SchemaError> {
        for arg in field.args.values_mut() {
            *arg = self.run_input_field(arg.clone(), cx)?;
        }

        let mut field = self.fold(field, HookPhase::OutputFieldConfig, |plugin, c| {
            plugin.on_output_field_config(c, cx)
        })?;

        // Interface fields are never resolved directly.
        if field.kind() != FieldKind::Interface {
            let resolver = self.wrap(&field, cx)?;
            field.resolver = Some(resolver);
        }

        Ok(field)
    }

    /// Folds `wrap_resolve` over the field's resolver. The last plugin's
    /// wrapper ends up outermost.
    fn wrap(
        &self,
        field: &OutputFieldConfig,
        cx: &HookContext<'_>,
    ) -> Result<Resolver, SchemaError> {
        let mut resolver = match (&field.resolver, field.kind()) {
            (Some(resolver), _) => resolver.clone(),
            (None, FieldKind::Subscription) => identity_resolver(),
            (None, _) => property_resolver(field.name()),
        };

        for instance in &self.plugins {
            trace!(
                plugin = %instance.name,
                phase = %HookPhase::WrapResolve,
                element = %field.field_ref(),
                "Running hook"
            );
            let inner = resolver;
            resolver = guard(&instance.name, HookPhase::WrapResolve, || {
                instance.plugin.wrap_resolve(inner, field, cx)
            })?;
        }

        Ok(resolver)
    }

    /// Runs `on_schema_build` once over the whole IR.
    pub(crate) fn run_schema_build(
        &self,
        mut ir: SchemaIr,
        config: &SchemaBuilderConfig,
    ) -> Result<SchemaIr, SchemaError> {
        for instance in &self.plugins {
            trace!(plugin = %instance.name, phase = %HookPhase::SchemaBuild, "Running hook");
            ir = guard(&instance.name, HookPhase::SchemaBuild, || {
                instance.plugin.on_schema_build(ir, config)
            })?;
        }
        Ok(ir)
    }

    /// Runs `after_build` once over the compiled schema.
    pub(crate) fn run_after_build(
        &self,
        mut schema: Schema,
        config: &SchemaBuilderConfig,
    ) -> Result<Schema, SchemaError> {
        for instance in &self.plugins {
            trace!(plugin = %instance.name, phase = %HookPhase::AfterBuild, "Running hook");
            schema = guard(&instance.name, HookPhase::AfterBuild, || {
                instance.plugin.after_build(schema, config)
            })?;
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_graphql::Value;
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::context::RequestContext;
    use crate::ir::TypeParam;
    use crate::refs::TypeRef;
    use crate::resolver::{ResolveInfo, ResolveParams, resolver};

    struct Marker(&'static str);

    impl Plugin for Marker {
        fn on_type_config(
            &self,
            mut config: TypeConfig,
            _cx: &HookContext<'_>,
        ) -> Result<TypeConfig, PluginError> {
            let mut markers = config
                .extensions
                .get("markers")
                .cloned()
                .unwrap_or_else(|| json!([]));
            if let Some(list) = markers.as_array_mut() {
                list.push(json!(self.0));
            }
            config.extensions.insert("markers".into(), markers);
            Ok(config)
        }
    }

    struct Renamer;

    impl Plugin for Renamer {
        fn on_type_config(
            &self,
            config: TypeConfig,
            _cx: &HookContext<'_>,
        ) -> Result<TypeConfig, PluginError> {
            Ok(TypeConfig::new(config.kind(), format!("{}Renamed", config.name())))
        }
    }

    struct Panicky;

    impl Plugin for Panicky {
        fn on_enum_value_config(
            &self,
            _config: EnumValueConfig,
            _cx: &HookContext<'_>,
        ) -> Result<EnumValueConfig, PluginError> {
            panic!("enum values are not welcome here")
        }
    }

    struct Tracer {
        tag: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Plugin for Tracer {
        fn wrap_resolve(
            &self,
            inner: Resolver,
            _field: &OutputFieldConfig,
            _cx: &HookContext<'_>,
        ) -> Result<Resolver, PluginError> {
            let tag = self.tag;
            let calls = Arc::clone(&self.calls);
            Ok(resolver(move |params| {
                let inner = Arc::clone(&inner);
                let calls = Arc::clone(&calls);
                async move {
                    calls.lock().unwrap().push(format!("{tag}-before"));
                    let value = inner(params).await;
                    calls.lock().unwrap().push(format!("{tag}-after"));
                    value
                }
            }))
        }
    }

    fn pipeline(plugins: Vec<(&str, Arc<dyn Plugin>)>) -> Pipeline {
        Pipeline::new(
            plugins
                .into_iter()
                .map(|(name, plugin)| PluginInstance {
                    name: name.to_string(),
                    plugin,
                })
                .collect(),
        )
    }

    fn ir() -> SchemaIr {
        let mut ir = SchemaIr::default();
        ir.roots.query = Some("Query".into());
        for config in [
            TypeConfig::new(TypeKind::Object, "Query"),
            TypeConfig::new(TypeKind::Enum, "Role"),
        ] {
            ir.types.insert(config.name().to_string(), config);
        }

        let field = OutputFieldConfig::new(
            "Query",
            "hello",
            FieldKind::Query,
            TypeParam::named(TypeRef::string()),
        );
        let mut fields = IndexMap::new();
        fields.insert("hello".to_string(), field);
        ir.fields.insert("Query".into(), fields);

        let mut values = IndexMap::new();
        values.insert("ADMIN".to_string(), EnumValueConfig::new("Role", "ADMIN"));
        ir.enum_values.insert("Role".into(), values);
        ir
    }

    fn params() -> ResolveParams {
        let mut parent = async_graphql::indexmap::IndexMap::new();
        parent.insert(async_graphql::Name::new("hello"), Value::String("world".into()));
        ResolveParams {
            parent: Value::Object(parent),
            args: Default::default(),
            context: Arc::new(RequestContext::default()),
            info: ResolveInfo {
                parent_type: "Query".into(),
                field_name: "hello".into(),
                return_type: "String!".into(),
            },
        }
    }

    #[test]
    fn test_type_hooks_fold_in_configured_order() {
        let pipeline = pipeline(vec![
            ("p1", Arc::new(Marker("P1")) as Arc<dyn Plugin>),
            ("p2", Arc::new(Marker("P2")) as Arc<dyn Plugin>),
        ]);
        let mut ir = ir();
        pipeline
            .run_element_hooks(&mut ir, &SchemaBuilderConfig::default())
            .unwrap();

        assert_eq!(ir.types["Query"].extensions["markers"], json!(["P1", "P2"]));
        assert_eq!(ir.types["Role"].extensions["markers"], json!(["P1", "P2"]));
    }

    #[test]
    fn test_identity_change_is_rejected() {
        let pipeline = pipeline(vec![("renamer", Arc::new(Renamer) as Arc<dyn Plugin>)]);
        let err = pipeline
            .run_element_hooks(&mut ir(), &SchemaBuilderConfig::default())
            .unwrap_err();
        assert_eq!(err.hook_origin(), Some(("renamer", HookPhase::TypeConfig)));
    }

    #[test]
    fn test_panic_is_attributed() {
        let pipeline = pipeline(vec![("panicky", Arc::new(Panicky) as Arc<dyn Plugin>)]);
        let err = pipeline
            .run_element_hooks(&mut ir(), &SchemaBuilderConfig::default())
            .unwrap_err();

        assert_eq!(err.hook_origin(), Some(("panicky", HookPhase::EnumValueConfig)));
        assert!(err.to_string().contains("enum values are not welcome here"));
    }

    #[tokio::test]
    async fn test_last_plugin_wraps_outermost() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pipeline = pipeline(vec![
            ("a", Arc::new(Tracer { tag: "a", calls: Arc::clone(&calls) }) as Arc<dyn Plugin>),
            ("b", Arc::new(Tracer { tag: "b", calls: Arc::clone(&calls) }) as Arc<dyn Plugin>),
        ]);
        let mut ir = ir();
        pipeline
            .run_element_hooks(&mut ir, &SchemaBuilderConfig::default())
            .unwrap();

        let resolve = ir.fields["Query"]["hello"].resolver.clone().unwrap();
        let value = resolve(params()).await.unwrap();

        assert_eq!(value, Value::String("world".into()));
        assert_eq!(
            *calls.lock().unwrap(),
            ["b-before", "a-before", "a-after", "b-after"]
        );
    }

    #[test]
    fn test_panic_message_fallback() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "Unknown panic");
    }
}
