//! Local-variable slot assignment
//!
//! Populates each method's name -> (slot, type) table before the backend
//! runs: slot 0 is the receiver in instance methods, parameters follow in
//! declaration order, then locals and temporaries in first-appearance
//! order. The named constants `true`/`false` never occupy a slot.

use std::collections::HashMap;

use super::{CallKind, ClassUnit, Element, Instruction, Method, Type, VarEntry};

/// Assign slots for every method of the unit
pub fn build_var_tables(unit: &mut ClassUnit) {
    let class_name = unit.name.clone();
    for method in &mut unit.methods {
        build_method_table(&class_name, method);
    }
}

fn build_method_table(class_name: &str, method: &mut Method) {
    let mut table = HashMap::new();
    let mut next: u16 = 0;

    if !method.is_static {
        table.insert(
            "this".to_string(),
            VarEntry {
                slot: 0,
                ty: Type::Class(class_name.to_string()),
            },
        );
        next = 1;
    }

    for param in &method.params {
        define(&mut table, &mut next, &param.name, param.ty.clone());
    }

    for instruction in &method.instructions {
        visit_instruction(&mut table, &mut next, instruction);
    }

    method.var_table = table;
}

fn define(table: &mut HashMap<String, VarEntry>, next: &mut u16, name: &str, ty: Type) {
    // `true`/`false` are constants handled by the loader
    if name == "true" || name == "false" {
        return;
    }
    if !table.contains_key(name) {
        table.insert(name.to_string(), VarEntry { slot: *next, ty });
        *next += 1;
    }
}

fn visit_instruction(
    table: &mut HashMap<String, VarEntry>,
    next: &mut u16,
    instruction: &Instruction,
) {
    match instruction {
        Instruction::Assign { dest, rhs } => {
            visit_element(table, next, dest);
            visit_instruction(table, next, rhs);
        }
        Instruction::Call(call) => {
            // `new(C)` and `invokestatic(C, ...)` name a class, not a local
            if !matches!(call.kind, CallKind::New | CallKind::InvokeStatic) {
                visit_element(table, next, &call.target);
            }
            for arg in &call.args {
                visit_element(table, next, arg);
            }
        }
        Instruction::Goto { .. } => {}
        Instruction::Branch { condition, .. } => visit_instruction(table, next, condition),
        Instruction::Return { value, .. } => {
            if let Some(value) = value {
                visit_element(table, next, value);
            }
        }
        Instruction::GetField { receiver, .. } => visit_element(table, next, receiver),
        Instruction::PutField { receiver, value, .. } => {
            visit_element(table, next, receiver);
            visit_element(table, next, value);
        }
        Instruction::UnaryOp { operand, .. } => visit_element(table, next, operand),
        Instruction::BinaryOp { left, right, .. } => {
            visit_element(table, next, left);
            visit_element(table, next, right);
        }
        Instruction::SingleOperand(element) => visit_element(table, next, element),
    }
}

fn visit_element(table: &mut HashMap<String, VarEntry>, next: &mut u16, element: &Element) {
    match element {
        Element::Variable { name, ty } => define(table, next, name, ty.clone()),
        Element::ArrayAccess { name, index, .. } => {
            define(table, next, name, Type::IntArray);
            visit_element(table, next, index);
        }
        Element::Literal { .. } | Element::This => {}
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_unit;
    use super::*;

    fn prepared(source: &str) -> ClassUnit {
        let mut unit = parse_unit(source).expect("parse failed");
        build_var_tables(&mut unit);
        unit
    }

    #[test]
    fn test_receiver_then_params_then_temps() {
        let unit = prepared(
            "class A { .method f(a.i32, b.i32).i32 { t0.i32 := a.i32 +.i32 b.i32; ret.i32 t0.i32; } }",
        );
        let table = &unit.methods[0].var_table;
        assert_eq!(table["this"].slot, 0);
        assert_eq!(table["a"].slot, 1);
        assert_eq!(table["b"].slot, 2);
        assert_eq!(table["t0"].slot, 3);
    }

    #[test]
    fn test_static_method_starts_at_zero() {
        let unit = prepared("class A { .method static f(a.i32).V { ret.V; } }");
        let table = &unit.methods[0].var_table;
        assert!(!table.contains_key("this"));
        assert_eq!(table["a"].slot, 0);
    }

    #[test]
    fn test_named_booleans_and_classes_get_no_slot() {
        let unit = prepared(
            "class A { .method f().bool { b.bool := true.bool; x.Other := new(Other).Other; ret.bool b.bool; } }",
        );
        let table = &unit.methods[0].var_table;
        assert!(!table.contains_key("true"));
        assert!(!table.contains_key("Other"));
        assert_eq!(table["b"].slot, 1);
        assert_eq!(table["x"].slot, 2);
    }

    #[test]
    fn test_array_variable_records_array_type() {
        let unit = prepared("class A { .method static f().V { a[0.i32].i32 := 1.i32; ret.V; } }");
        let table = &unit.methods[0].var_table;
        assert_eq!(table["a"].ty, Type::IntArray);
        assert_eq!(table["a"].slot, 0);
    }
}
