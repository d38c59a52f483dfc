//! Config store.
//!
//! Accumulates declarations in declaration order. Type configs are stored as
//! declared; field callbacks are kept and run when a build collects the IR,
//! so a field may name a type that is declared later.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use super::fields::{FieldBuilder, FieldsFn, InputFieldBuilder, InputFieldsFn};
use crate::error::SchemaError;
use crate::ir::{EnumValueConfig, FieldKind, OutputFieldConfig, RootTypes, SchemaIr, TypeConfig};
use crate::refs::{TypeKind, TypeRef, is_builtin_scalar};

#[derive(Clone, Default)]
pub(crate) struct ConfigStore {
    types: IndexMap<String, TypeConfig>,
    field_blocks: IndexMap<String, Vec<FieldsFn>>,
    input_blocks: IndexMap<String, Vec<InputFieldsFn>>,
    enum_values: IndexMap<String, IndexMap<String, EnumValueConfig>>,
    /// Refs handed out by forward declarations or field-block registration.
    declared: IndexSet<TypeRef>,
    /// Names that were registered more than once.
    duplicates: Vec<String>,
    pub(crate) roots: RootTypes,
}

impl ConfigStore {
    /// Registers a type config; its name must be unused.
    pub(crate) fn register_type(&mut self, config: TypeConfig) -> Result<TypeRef, SchemaError> {
        let name = config.name().to_string();
        if self.types.contains_key(&name) || is_builtin_scalar(&name) {
            debug!(name = %name, "Duplicate type registration");
            self.duplicates.push(name.clone());
            return Err(SchemaError::duplicate_type(name));
        }

        trace!(kind = %config.kind(), name = %name, "Registered type");
        let type_ref = config.type_ref();
        self.types.insert(name, config);
        Ok(type_ref)
    }

    pub(crate) fn register_enum_values(&mut self, parent: &str, values: Vec<EnumValueConfig>) {
        let values = values
            .into_iter()
            .map(|value| (value.name().to_string(), value))
            .collect();
        self.enum_values.insert(parent.to_string(), values);
    }

    /// Records a ref that must resolve at build time.
    pub(crate) fn declare(&mut self, type_ref: TypeRef) -> TypeRef {
        if !type_ref.is_builtin() {
            self.declared.insert(type_ref.clone());
        }
        type_ref
    }

    pub(crate) fn declared(&self) -> impl Iterator<Item = &TypeRef> {
        self.declared.iter()
    }

    pub(crate) fn add_fields(&mut self, parent: &str, fields: FieldsFn) {
        self.field_blocks
            .entry(parent.to_string())
            .or_default()
            .push(fields);
    }

    pub(crate) fn add_input_fields(&mut self, parent: &str, fields: InputFieldsFn) {
        self.input_blocks
            .entry(parent.to_string())
            .or_default()
            .push(fields);
    }

    /// Fails with the first duplicate registration, if any happened.
    pub(crate) fn check_poisoned(&self) -> Result<(), SchemaError> {
        match self.duplicates.first() {
            Some(name) => Err(SchemaError::duplicate_type(name.as_str())),
            None => Ok(()),
        }
    }

    /// Looks up the config a ref points at.
    ///
    /// Built-in scalars have no config and are reported as unresolved.
    pub(crate) fn resolve(&self, type_ref: &TypeRef) -> Result<&TypeConfig, SchemaError> {
        let config = self
            .types
            .get(type_ref.name())
            .ok_or_else(|| SchemaError::unresolved(type_ref))?;
        if config.kind() != type_ref.kind() {
            return Err(SchemaError::RefKindMismatch {
                reference: type_ref.to_string(),
                actual: config.kind().to_string(),
            });
        }
        Ok(config)
    }

    pub(crate) fn len(&self) -> usize {
        self.types.len()
    }

    /// Runs every field callback and assembles a fresh IR.
    ///
    /// Objects inherit the fields of the interfaces they implement.
    pub(crate) fn collect(&self) -> Result<SchemaIr, SchemaError> {
        let mut ir = SchemaIr {
            types: self.types.clone(),
            roots: self.roots.clone(),
            ..SchemaIr::default()
        };

        for config in self.types.values() {
            let name = config.name();
            match config.kind() {
                TypeKind::Object | TypeKind::Interface => {
                    let kind = ir.roots.field_kind(name, config.kind());
                    let mut builder = FieldBuilder::new(name, kind);
                    for block in self.field_blocks.get(name).into_iter().flatten() {
                        block(&mut builder);
                    }
                    ir.fields.insert(name.to_string(), builder.finish()?);
                }
                TypeKind::InputObject => {
                    let mut builder = InputFieldBuilder::new(name);
                    for block in self.input_blocks.get(name).into_iter().flatten() {
                        block(&mut builder);
                    }
                    ir.input_fields.insert(name.to_string(), builder.finish()?);
                }
                TypeKind::Enum => {
                    let values = self.enum_values.get(name).cloned().unwrap_or_default();
                    ir.enum_values.insert(name.to_string(), values);
                }
                TypeKind::Union | TypeKind::Scalar => {}
            }
        }

        inherit_interface_fields(&mut ir);
        Ok(ir)
    }
}

/// Copies interface fields onto implementing objects that do not declare
/// them. Inherited fields come first, in interface order.
fn inherit_interface_fields(ir: &mut SchemaIr) {
    let objects: Vec<(String, Vec<TypeRef>)> = ir
        .types
        .values()
        .filter(|t| t.kind() == TypeKind::Object && !t.interfaces.is_empty())
        .map(|t| (t.name().to_string(), t.interfaces.clone()))
        .collect();

    for (object, interfaces) in objects {
        let kind = ir.roots.field_kind(&object, TypeKind::Object);
        let own = ir.fields.get(&object).cloned().unwrap_or_default();
        let merged = inherit_fields(&ir.fields, &object, kind, &interfaces, own);
        ir.fields.insert(object, merged);
    }
}

/// Fields of `object` after inheriting from `interfaces`. Fields in `own`
/// win over interface fields of the same name.
pub(crate) fn inherit_fields(
    fields: &IndexMap<String, IndexMap<String, OutputFieldConfig>>,
    object: &str,
    kind: FieldKind,
    interfaces: &[TypeRef],
    own: IndexMap<String, OutputFieldConfig>,
) -> IndexMap<String, OutputFieldConfig> {
    let mut merged = IndexMap::new();
    for interface in interfaces {
        let Some(interface_fields) = fields.get(interface.name()) else {
            continue;
        };
        for (name, field) in interface_fields {
            if !own.contains_key(name) && !merged.contains_key(name) {
                trace!(
                    object = %object,
                    field = %name,
                    interface = %interface.name(),
                    "Inherited field"
                );
                merged.insert(name.clone(), field.reparent(object, kind));
            }
        }
    }
    merged.extend(own);
    merged
}
