//! Reference and consistency checks over the IR.
//!
//! Run once before the hooks, to report unresolved or misused refs from the
//! declarations, and once after `on_schema_build`, so the compiler only ever
//! sees an IR whose keys, refs, and type usages agree.

use crate::error::SchemaError;
use crate::ir::{FieldKind, InputFieldConfig, SchemaIr};
use crate::refs::{TypeKind, TypeRef};

/// Resolves a ref against the IR, checking its kind.
pub(crate) fn resolve_kind(ir: &SchemaIr, type_ref: &TypeRef) -> Result<TypeKind, SchemaError> {
    if type_ref.is_builtin() {
        return Ok(TypeKind::Scalar);
    }
    match ir.types.get(type_ref.name()) {
        None => Err(SchemaError::unresolved(type_ref)),
        Some(config) if config.kind() != type_ref.kind() => Err(SchemaError::RefKindMismatch {
            reference: type_ref.to_string(),
            actual: config.kind().to_string(),
        }),
        Some(config) => Ok(config.kind()),
    }
}

fn expect_kind(
    ir: &SchemaIr,
    type_ref: &TypeRef,
    kind: TypeKind,
    usage: &str,
) -> Result<(), SchemaError> {
    if resolve_kind(ir, type_ref)? == kind {
        Ok(())
    } else {
        Err(SchemaError::InvalidTypeUsage {
            reference: type_ref.to_string(),
            usage: usage.to_string(),
        })
    }
}

/// Every declared ref must be implemented with the same kind.
pub(crate) fn check_declared<'a>(
    ir: &SchemaIr,
    declared: impl IntoIterator<Item = &'a TypeRef>,
) -> Result<(), SchemaError> {
    for type_ref in declared {
        resolve_kind(ir, type_ref)?;
    }
    Ok(())
}

/// Checks every ref in the IR and the kinds they are used as.
pub(crate) fn check_refs(ir: &SchemaIr) -> Result<(), SchemaError> {
    let roots = [
        (&ir.roots.query, "the query root"),
        (&ir.roots.mutation, "the mutation root"),
        (&ir.roots.subscription, "the subscription root"),
    ];
    for (root, usage) in roots {
        if let Some(name) = root {
            expect_kind(ir, &TypeRef::object(name.as_str()), TypeKind::Object, usage)?;
        }
    }

    for config in ir.types.values() {
        for interface in &config.interfaces {
            expect_kind(ir, interface, TypeKind::Interface, "an implemented interface")?;
        }
        for member in &config.members {
            expect_kind(ir, member, TypeKind::Object, "a union member")?;
        }
    }

    for fields in ir.fields.values() {
        for field in fields.values() {
            let base = field.type_param.base();
            if !resolve_kind(ir, base)?.is_output() {
                return Err(SchemaError::InvalidTypeUsage {
                    reference: base.to_string(),
                    usage: format!("the type of output field {}", field.field_ref()),
                });
            }
            for arg in field.args.values() {
                check_input(ir, arg)?;
            }
        }
    }

    for fields in ir.input_fields.values() {
        for field in fields.values() {
            check_input(ir, field)?;
        }
    }

    Ok(())
}

fn check_input(ir: &SchemaIr, field: &InputFieldConfig) -> Result<(), SchemaError> {
    let base = field.type_param.base();
    if resolve_kind(ir, base)?.is_input() {
        Ok(())
    } else {
        Err(SchemaError::InvalidTypeUsage {
            reference: base.to_string(),
            usage: format!("the type of input field {}", field.input_ref()),
        })
    }
}

/// Checks that map keys match element identities and that every element
/// hangs off a type of the right kind.
pub(crate) fn check_consistency(ir: &SchemaIr) -> Result<(), SchemaError> {
    let inconsistent = |msg: String| Err(SchemaError::InconsistentConfig(msg));

    for (name, config) in &ir.types {
        if name != config.name() {
            return inconsistent(format!("type '{}' is stored under '{name}'", config.name()));
        }
    }

    for (parent, fields) in &ir.fields {
        match ir.types.get(parent).map(|t| t.kind()) {
            Some(TypeKind::Object | TypeKind::Interface) => {}
            _ => {
                return inconsistent(format!(
                    "output fields attached to '{parent}', which is not an object or interface"
                ));
            }
        }
        for (name, field) in fields {
            if name != field.name() || parent != field.parent_type() {
                return inconsistent(format!(
                    "{} is stored under '{parent}.{name}'",
                    field.field_ref()
                ));
            }
            if field.kind() == FieldKind::Subscription && field.subscriber.is_none() {
                return inconsistent(format!(
                    "subscription field {} has no subscribe function",
                    field.field_ref()
                ));
            }
            let arg_parent = field.arg_parent();
            for (arg_name, arg) in &field.args {
                if arg_name != arg.name() || arg.parent() != arg_parent {
                    return inconsistent(format!(
                        "{} is stored under '{arg_parent}.{arg_name}'",
                        arg.input_ref()
                    ));
                }
            }
        }
    }

    for config in ir.types.values().filter(|t| t.kind() == TypeKind::Object) {
        let own = ir.fields.get(config.name());
        for interface in &config.interfaces {
            for name in ir.fields.get(interface.name()).into_iter().flat_map(|f| f.keys()) {
                if !own.is_some_and(|own| own.contains_key(name)) {
                    return inconsistent(format!(
                        "object '{}' is missing field '{name}' of interface '{}'",
                        config.name(),
                        interface.name()
                    ));
                }
            }
        }
    }

    for (parent, fields) in &ir.input_fields {
        if ir.types.get(parent).map(|t| t.kind()) != Some(TypeKind::InputObject) {
            return inconsistent(format!(
                "input fields attached to '{parent}', which is not an input object"
            ));
        }
        for (name, field) in fields {
            if name != field.name() || parent != field.parent() {
                return inconsistent(format!(
                    "{} is stored under '{parent}.{name}'",
                    field.input_ref()
                ));
            }
        }
    }

    for (parent, values) in &ir.enum_values {
        if ir.types.get(parent).map(|t| t.kind()) != Some(TypeKind::Enum) {
            return inconsistent(format!(
                "enum values attached to '{parent}', which is not an enum"
            ));
        }
        for (name, value) in values {
            if name != value.name() || parent != value.parent_type() {
                return inconsistent(format!(
                    "enum value '{}' is stored under '{parent}.{name}'",
                    value.name()
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::ir::{InputFieldKind, OutputFieldConfig, TypeConfig, TypeParam};

    fn ir_with(types: &[(TypeKind, &str)]) -> SchemaIr {
        let mut ir = SchemaIr::default();
        for (kind, name) in types {
            ir.types.insert(name.to_string(), TypeConfig::new(*kind, *name));
        }
        ir
    }

    fn add_field(ir: &mut SchemaIr, parent: &str, name: &str, type_param: TypeParam) {
        let field = OutputFieldConfig::new(parent, name, FieldKind::Object, type_param);
        ir.fields
            .entry(parent.to_string())
            .or_insert_with(IndexMap::new)
            .insert(name.to_string(), field);
    }

    #[test]
    fn test_builtin_scalars_always_resolve() {
        let ir = SchemaIr::default();
        assert_eq!(resolve_kind(&ir, &TypeRef::string()).unwrap(), TypeKind::Scalar);
        assert_eq!(resolve_kind(&ir, &TypeRef::id()).unwrap(), TypeKind::Scalar);
    }

    #[test]
    fn test_unresolved_field_type() {
        let mut ir = ir_with(&[(TypeKind::Object, "User")]);
        add_field(&mut ir, "User", "posts", TypeParam::list(TypeRef::object("Post")));

        let err = check_refs(&ir).unwrap_err();
        assert_eq!(err.to_string(), "unresolved reference ObjectRef<Post>");
    }

    #[test]
    fn test_input_object_as_output_type() {
        let mut ir = ir_with(&[(TypeKind::Object, "User"), (TypeKind::InputObject, "UserInput")]);
        add_field(&mut ir, "User", "input", TypeParam::named(TypeRef::input("UserInput")));

        assert!(matches!(
            check_refs(&ir),
            Err(SchemaError::InvalidTypeUsage { ref reference, .. })
                if reference == "InputObjectRef<UserInput>"
        ));
    }

    #[test]
    fn test_object_as_argument_type() {
        let mut ir = ir_with(&[(TypeKind::Object, "User")]);
        add_field(&mut ir, "User", "friend", TypeParam::named(TypeRef::object("User")));
        let field = &ir.fields["User"]["friend"];
        let arg =
            InputFieldConfig::argument(field, "like", TypeParam::named(TypeRef::object("User")));
        ir.fields
            .get_mut("User")
            .unwrap()
            .get_mut("friend")
            .unwrap()
            .args
            .insert("like".into(), arg);

        assert!(matches!(check_refs(&ir), Err(SchemaError::InvalidTypeUsage { .. })));
    }

    #[test]
    fn test_union_member_must_be_object() {
        let mut ir = ir_with(&[(TypeKind::Interface, "Node"), (TypeKind::Union, "Result")]);
        ir.types.get_mut("Result").unwrap().members = vec![TypeRef::object("Node")];

        assert!(matches!(
            check_refs(&ir),
            Err(SchemaError::RefKindMismatch { ref actual, .. }) if actual == "Interface"
        ));
    }

    #[test]
    fn test_declared_refs() {
        let ir = ir_with(&[(TypeKind::Object, "User")]);
        assert!(check_declared(&ir, &[TypeRef::object("User")]).is_ok());
        assert!(matches!(
            check_declared(&ir, &[TypeRef::object("Ghost")]),
            Err(SchemaError::UnresolvedReference { ref reference })
                if reference == "ObjectRef<Ghost>"
        ));
    }

    #[test]
    fn test_key_mismatch_is_inconsistent() {
        let mut ir = ir_with(&[(TypeKind::InputObject, "Filter")]);
        let field = InputFieldConfig::new(
            "Filter",
            "tag",
            InputFieldKind::InputObject,
            TypeParam::named(TypeRef::string()),
        );
        let mut fields = IndexMap::new();
        fields.insert("label".to_string(), field);
        ir.input_fields.insert("Filter".into(), fields);

        assert!(matches!(
            check_consistency(&ir),
            Err(SchemaError::InconsistentConfig(_))
        ));
    }

    #[test]
    fn test_missing_interface_field_is_inconsistent() {
        let mut ir = ir_with(&[(TypeKind::Interface, "Node"), (TypeKind::Object, "User")]);
        ir.types.get_mut("User").unwrap().interfaces.push(TypeRef::interface("Node"));
        add_field(&mut ir, "Node", "id", TypeParam::named(TypeRef::id()));
        add_field(&mut ir, "User", "name", TypeParam::named(TypeRef::string()));

        assert!(matches!(
            check_consistency(&ir),
            Err(SchemaError::InconsistentConfig(ref msg))
                if msg.contains("'id' of interface 'Node'")
        ));

        add_field(&mut ir, "User", "id", TypeParam::named(TypeRef::id()));
        assert!(check_consistency(&ir).is_ok());
    }
}
