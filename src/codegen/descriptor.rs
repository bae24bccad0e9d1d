//! Type descriptor encoding and class-name resolution
//!
//! Class references are resolved against the unit's import list: a simple
//! name matching the last segment of an import is rewritten to that
//! import's slash-separated path. Anything else passes through unchanged
//! (a class in the same unit, or an already-qualified name). The
//! pseudo-class `this` names the unit's own class.

use crate::ir::{ClassUnit, Element, Type};

/// Descriptor string for one type
pub fn descriptor(ty: &Type, unit: &ClassUnit) -> String {
    match ty {
        Type::Void => "V".to_string(),
        Type::Int => "I".to_string(),
        Type::Bool => "Z".to_string(),
        Type::String => "Ljava/lang/String;".to_string(),
        Type::IntArray => "[I".to_string(),
        Type::Class(name) => format!("L{};", resolve_class(name, unit)),
    }
}

/// Resolve a class name through the import list
pub fn resolve_class(name: &str, unit: &ClassUnit) -> String {
    if name == "this" {
        return unit.name.clone();
    }
    for import in &unit.imports {
        if import.rsplit('.').next() == Some(name) {
            return import.replace('.', "/");
        }
    }
    name.to_string()
}

/// Resolved superclass path, defaulting to the runtime's root object type
pub fn resolve_super(unit: &ClassUnit) -> String {
    match &unit.super_class {
        None => "java/lang/Object".to_string(),
        Some(name) => {
            let resolved = resolve_class(name, unit);
            if resolved == "Object" {
                "java/lang/Object".to_string()
            } else {
                resolved
            }
        }
    }
}

/// `(<arg descriptors>)<return descriptor>` for a call site
pub fn call_descriptor(args: &[Element], return_type: &Type, unit: &ClassUnit) -> String {
    let mut out = String::from("(");
    for arg in args {
        out.push_str(&descriptor(&arg.ty(), unit));
    }
    out.push(')');
    out.push_str(&descriptor(return_type, unit));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::parse_unit;

    fn unit_with_imports() -> ClassUnit {
        parse_unit("import io.Console; import util.math.Calc; class A extends Base { }")
            .expect("parse failed")
    }

    #[test]
    fn test_primitive_descriptors() {
        let unit = unit_with_imports();
        assert_eq!(descriptor(&Type::Void, &unit), "V");
        assert_eq!(descriptor(&Type::Int, &unit), "I");
        assert_eq!(descriptor(&Type::Bool, &unit), "Z");
        assert_eq!(descriptor(&Type::String, &unit), "Ljava/lang/String;");
        assert_eq!(descriptor(&Type::IntArray, &unit), "[I");
    }

    #[test]
    fn test_imported_class_is_qualified() {
        let unit = unit_with_imports();
        assert_eq!(
            descriptor(&Type::Class("Calc".to_string()), &unit),
            "Lutil/math/Calc;"
        );
        assert_eq!(resolve_class("Console", &unit), "io/Console");
    }

    #[test]
    fn test_unimported_class_passes_through() {
        let unit = unit_with_imports();
        assert_eq!(resolve_class("Helper", &unit), "Helper");
    }

    #[test]
    fn test_import_matches_whole_segment_only() {
        let unit = parse_unit("import util.BarBaz; class A { }").expect("parse failed");
        assert_eq!(resolve_class("Baz", &unit), "Baz");
        assert_eq!(resolve_class("BarBaz", &unit), "util/BarBaz");
    }

    #[test]
    fn test_this_resolves_to_current_class() {
        let unit = unit_with_imports();
        assert_eq!(resolve_class("this", &unit), "A");
    }

    #[test]
    fn test_super_resolution() {
        let unit = unit_with_imports();
        assert_eq!(resolve_super(&unit), "Base");

        let bare = parse_unit("class A { }").expect("parse failed");
        assert_eq!(resolve_super(&bare), "java/lang/Object");

        let object = parse_unit("class A extends Object { }").expect("parse failed");
        assert_eq!(resolve_super(&object), "java/lang/Object");
    }
}
