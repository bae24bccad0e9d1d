//! Per-instruction lowering
//!
//! One rule per IR instruction kind. The instruction set is closed, so
//! dispatch is an exhaustive match; shapes inside a kind that have no
//! encoding (a non-int array allocation, a unary operator other than
//! negation) fall back to the inline marker and translation continues.

use super::branch::lower_condition;
use super::context::EmitContext;
use super::descriptor::{call_descriptor, resolve_class};
use super::loader::{load_element, slot_suffix, var_slot};
use super::unsupported;
use crate::ir::{Call, CallKind, Element, Instruction, Method, Operation, Type};

/// Emit the lowering of one instruction
pub fn translate_instruction(
    ctx: &mut EmitContext,
    method: &Method,
    instruction: &Instruction,
) -> String {
    match instruction {
        Instruction::Assign { dest, rhs } => translate_assign(ctx, method, dest, rhs),
        Instruction::Call(call) => translate_call(ctx, method, call),
        Instruction::Goto { label } => format!("\tgoto {}\n", label),
        Instruction::Branch { condition, label } => {
            lower_condition(ctx, method, condition, label)
        }
        Instruction::Return { value, .. } => translate_return(ctx, method, value.as_ref()),
        Instruction::GetField {
            receiver,
            field,
            field_type,
        } => {
            let mut out = load_element(ctx, method, receiver);
            match field_owner(ctx, receiver) {
                Some(owner) => {
                    // getfield swaps the receiver for the value, net 0
                    out.push_str(&format!(
                        "\tgetfield {}/{} {}\n",
                        owner,
                        field,
                        super::descriptor::descriptor(field_type, ctx.unit)
                    ));
                }
                None => out.push_str(&unsupported(format!("field read through {:?}", receiver))),
            }
            out
        }
        Instruction::PutField {
            receiver,
            field,
            field_type,
            value,
        } => {
            let mut out = load_element(ctx, method, receiver);
            out.push_str(&load_element(ctx, method, value));
            match field_owner(ctx, receiver) {
                Some(owner) => {
                    out.push_str(&format!(
                        "\tputfield {}/{} {}\n",
                        owner,
                        field,
                        super::descriptor::descriptor(field_type, ctx.unit)
                    ));
                    ctx.stack.adjust(-2);
                }
                None => out.push_str(&unsupported(format!("field write through {:?}", receiver))),
            }
            out
        }
        Instruction::UnaryOp { op, operand, .. } => match op {
            Operation::Not => {
                let mut out = load_element(ctx, method, operand);
                out.push_str(&materialize_bool(ctx, "ifeq", -1));
                out
            }
            other => unsupported(format!("unary operator '{}'", other)),
        },
        Instruction::BinaryOp { op, left, right, .. } => {
            if op.is_relational() {
                // Produce a real 0/1 value through a branch
                materialize_comparison(ctx, method, instruction)
            } else {
                let opcode = match op {
                    Operation::Add => "iadd",
                    Operation::Sub => "isub",
                    Operation::Mul => "imul",
                    Operation::Div => "idiv",
                    Operation::And => "iand",
                    _ => return unsupported(format!("operator '{}'", op)),
                };
                let mut out = load_element(ctx, method, left);
                out.push_str(&load_element(ctx, method, right));
                out.push_str(&format!("\t{}\n", opcode));
                ctx.stack.adjust(-1);
                out
            }
        }
        Instruction::SingleOperand(element) => load_element(ctx, method, element),
    }
}

fn translate_assign(
    ctx: &mut EmitContext,
    method: &Method,
    dest: &Element,
    rhs: &Instruction,
) -> String {
    if let Some(out) = increment_form(method, dest, rhs) {
        // iinc touches no operand stack at all
        return out;
    }

    match dest {
        Element::ArrayAccess { name, index, .. } => {
            let mut out = match var_slot(method, name) {
                Some(slot) => {
                    ctx.stack.adjust(1);
                    format!("\taload{}\n", slot_suffix(slot))
                }
                None => unsupported(format!("array '{}' has no slot", name)),
            };
            out.push_str(&load_element(ctx, method, index));
            out.push_str(&translate_instruction(ctx, method, rhs));
            out.push_str("\tiastore\n");
            ctx.stack.adjust(-3);
            out
        }
        Element::Variable { name, ty } => {
            let mut out = translate_instruction(ctx, method, rhs);
            match var_slot(method, name) {
                Some(slot) => {
                    let store = match ty {
                        Type::Int | Type::Bool => "istore",
                        Type::String | Type::IntArray | Type::Class(_) => "astore",
                        Type::Void => {
                            out.push_str(&unsupported(format!("store into void '{}'", name)));
                            return out;
                        }
                    };
                    out.push_str(&format!("\t{}{}\n", store, slot_suffix(slot)));
                    ctx.stack.adjust(-1);
                }
                None => out.push_str(&unsupported(format!("variable '{}' has no slot", name))),
            }
            out
        }
        other => {
            let mut out = translate_instruction(ctx, method, rhs);
            out.push_str(&unsupported(format!("store target {:?}", other)));
            out
        }
    }
}

/// `x := x + k` / `x := x - k` with a byte-sized step compiles to `iinc`.
/// The addition form also matches with the literal on the left.
fn increment_form(method: &Method, dest: &Element, rhs: &Instruction) -> Option<String> {
    let dest_name = match dest {
        Element::Variable { name, ty } if ty.is_integer() => name,
        _ => return None,
    };
    let Instruction::BinaryOp { op, left, right, .. } = rhs else {
        return None;
    };

    let delta = match op {
        Operation::Add => {
            let (var, literal) = match (left.int_value(), right.int_value()) {
                (None, Some(value)) => (left, value),
                (Some(value), None) => (right, value),
                _ => return None,
            };
            if !is_variable_named(var, dest_name) || !(-128..=127).contains(&literal) {
                return None;
            }
            literal
        }
        Operation::Sub => {
            // Only `x - k`; a literal on the left is not an increment
            let value = right.int_value()?;
            if !is_variable_named(left, dest_name) || !(-127..=128).contains(&value) {
                return None;
            }
            -value
        }
        _ => return None,
    };

    let slot = var_slot(method, dest_name)?;
    Some(format!("\tiinc {} {}\n", slot, delta))
}

fn is_variable_named(element: &Element, name: &str) -> bool {
    matches!(element, Element::Variable { name: n, .. } if n == name)
}

fn translate_return(ctx: &mut EmitContext, method: &Method, value: Option<&Element>) -> String {
    match value {
        Some(value) => {
            let mut out = load_element(ctx, method, value);
            let opcode = if value.ty().is_integer() { "ireturn" } else { "areturn" };
            out.push_str(&format!("\t{}\n", opcode));
            ctx.stack.adjust(-1);
            out
        }
        None => "\treturn\n".to_string(),
    }
}

fn translate_call(ctx: &mut EmitContext, method: &Method, call: &Call) -> String {
    match call.kind {
        CallKind::ArrayLength => {
            let mut out = load_element(ctx, method, &call.target);
            // arraylength swaps the reference for the length, net 0
            out.push_str("\tarraylength\n");
            out
        }
        CallKind::New => {
            let mut out = String::new();
            for arg in &call.args {
                out.push_str(&load_element(ctx, method, arg));
            }
            match class_operand(&call.target) {
                Some(class) => {
                    out.push_str(&format!("\tnew {}\n", resolve_class(class, ctx.unit)));
                    ctx.stack.adjust(1);
                }
                None => out.push_str(&unsupported("object allocation without a class")),
            }
            out
        }
        CallKind::ArrayNew => {
            let mut out = load_element(ctx, method, &call.target);
            if call.return_type == Type::IntArray {
                // newarray swaps the size for the reference, net 0
                out.push_str("\tnewarray int\n");
            } else {
                out.push_str(&unsupported(format!(
                    "array of {}",
                    call.return_type
                )));
            }
            out
        }
        CallKind::LoadConstant => load_element(ctx, method, &call.target),
        CallKind::InvokeStatic => {
            let mut out = String::new();
            for arg in &call.args {
                out.push_str(&load_element(ctx, method, arg));
            }
            let Some(owner) = class_operand(&call.target) else {
                out.push_str(&unsupported("static call without an owner"));
                return out;
            };
            let Some(name) = call.method.as_deref() else {
                out.push_str(&unsupported("call without a method name"));
                return out;
            };
            out.push_str(&format!(
                "\tinvokestatic {}/{}{}\n",
                resolve_class(owner, ctx.unit),
                name,
                call_descriptor(&call.args, &call.return_type, ctx.unit)
            ));
            ctx.stack
                .adjust(-(call.args.len() as i32) + i32::from(!call.return_type.is_void()));
            out
        }
        CallKind::InvokeSpecial => {
            let mut out = load_element(ctx, method, &call.target);
            // The bare receiver dispatches to the superclass constructor,
            // anything else to the constructor of its declared class
            let owner = match &call.target {
                Element::This => ctx.super_name.clone(),
                other => match receiver_class(ctx, other) {
                    Some(owner) => owner,
                    None => {
                        out.push_str(&unsupported(format!("receiver {:?}", other)));
                        return out;
                    }
                },
            };
            let name = call.method.as_deref().unwrap_or("<init>");
            out.push_str(&format!(
                "\tinvokespecial {}/{}{}\n",
                owner,
                name,
                call_descriptor(&call.args, &call.return_type, ctx.unit)
            ));
            ctx.stack.adjust(-1 + i32::from(!call.return_type.is_void()));
            out
        }
        CallKind::InvokeVirtual => {
            let mut out = load_element(ctx, method, &call.target);
            for arg in &call.args {
                out.push_str(&load_element(ctx, method, arg));
            }
            let Some(owner) = receiver_class(ctx, &call.target) else {
                out.push_str(&unsupported(format!("receiver {:?}", call.target)));
                return out;
            };
            let Some(name) = call.method.as_deref() else {
                out.push_str(&unsupported("call without a method name"));
                return out;
            };
            out.push_str(&format!(
                "\tinvokevirtual {}/{}{}\n",
                owner,
                name,
                call_descriptor(&call.args, &call.return_type, ctx.unit)
            ));
            ctx.stack
                .adjust(-(1 + call.args.len() as i32) + i32::from(!call.return_type.is_void()));
            out
        }
    }
}

/// The 0/1 materialization idiom for a value-producing comparison
fn materialize_comparison(
    ctx: &mut EmitContext,
    method: &Method,
    comparison: &Instruction,
) -> String {
    let id = ctx.next_label();
    let true_label = format!("TRUE_{}", id);
    let next_label = format!("NEXT_{}", id);
    let mut out = lower_condition(ctx, method, comparison, &true_label);
    out.push_str(&bool_tail(ctx, &true_label, &next_label));
    out
}

/// Branch with `opcode`, then produce 0 on fall-through and 1 at the target
fn materialize_bool(ctx: &mut EmitContext, opcode: &str, branch_delta: i32) -> String {
    let id = ctx.next_label();
    let true_label = format!("TRUE_{}", id);
    let next_label = format!("NEXT_{}", id);
    ctx.stack.adjust(branch_delta);
    let mut out = format!("\t{} {}\n", opcode, true_label);
    out.push_str(&bool_tail(ctx, &true_label, &next_label));
    out
}

fn bool_tail(ctx: &mut EmitContext, true_label: &str, next_label: &str) -> String {
    // Exactly one of the two pushes executes
    ctx.stack.adjust(1);
    format!(
        "\ticonst_0\n\tgoto {next}\n{t}:\n\ticonst_1\n{next}:\n",
        t = true_label,
        next = next_label
    )
}

/// The class named by a receiver's declared type
fn receiver_class(ctx: &EmitContext, receiver: &Element) -> Option<String> {
    match receiver.ty() {
        Type::Class(name) => Some(resolve_class(&name, ctx.unit)),
        Type::String => Some("java/lang/String".to_string()),
        _ => None,
    }
}

/// The owner class for a field access through `receiver`
fn field_owner(ctx: &EmitContext, receiver: &Element) -> Option<String> {
    match receiver {
        Element::This => Some(ctx.unit.name.clone()),
        other => receiver_class(ctx, other),
    }
}

/// The bare class name carried by a `new` / `invokestatic` operand
fn class_operand(target: &Element) -> Option<&str> {
    match target {
        Element::Variable { name, .. } => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{parse_unit, vartable, ClassUnit};

    fn prepared(source: &str) -> ClassUnit {
        let mut unit = parse_unit(source).expect("parse failed");
        vartable::build_var_tables(&mut unit);
        unit
    }

    fn lower_first(unit: &ClassUnit) -> (String, i32, i32) {
        let method = &unit.methods[0];
        let mut ctx = EmitContext::new(unit);
        let out = translate_instruction(&mut ctx, method, &method.instructions[0]);
        (out, ctx.stack.depth(), ctx.stack.max())
    }

    #[test]
    fn test_small_increment_compiles_to_iinc() {
        let unit = prepared(
            "class A { .method f(x.i32).V { x.i32 := x.i32 +.i32 3.i32; ret.V; } }",
        );
        let (out, depth, max) = lower_first(&unit);
        assert_eq!(out, "\tiinc 1 3\n");
        assert_eq!(depth, 0);
        assert_eq!(max, 0);
    }

    #[test]
    fn test_commuted_increment_also_matches() {
        let unit = prepared(
            "class A { .method f(x.i32).V { x.i32 := 1.i32 +.i32 x.i32; ret.V; } }",
        );
        let (out, _, _) = lower_first(&unit);
        assert_eq!(out, "\tiinc 1 1\n");
    }

    #[test]
    fn test_decrement_within_range_compiles_to_iinc() {
        let unit = prepared(
            "class A { .method f(x.i32).V { x.i32 := x.i32 -.i32 128.i32; ret.V; } }",
        );
        let (out, _, _) = lower_first(&unit);
        assert_eq!(out, "\tiinc 1 -128\n");
    }

    #[test]
    fn test_large_step_falls_back_to_full_lowering() {
        let unit = prepared(
            "class A { .method f(x.i32).V { x.i32 := x.i32 -.i32 200.i32; ret.V; } }",
        );
        let (out, depth, max) = lower_first(&unit);
        assert_eq!(out, "\tiload_1\n\tsipush 200\n\tisub\n\tistore_1\n");
        assert_eq!(depth, 0);
        assert_eq!(max, 2);
    }

    #[test]
    fn test_other_variable_is_not_an_increment() {
        let unit = prepared(
            "class A { .method f(x.i32, y.i32).V { x.i32 := y.i32 +.i32 1.i32; ret.V; } }",
        );
        let (out, _, _) = lower_first(&unit);
        assert_eq!(out, "\tiload_2\n\ticonst_1\n\tiadd\n\tistore_1\n");
    }

    #[test]
    fn test_array_store_pops_three() {
        let unit = prepared(
            "class A { .method f(a.array.i32).V { a[0.i32].i32 := 7.i32; ret.V; } }",
        );
        let (out, depth, max) = lower_first(&unit);
        assert_eq!(out, "\taload_1\n\ticonst_0\n\tbipush 7\n\tiastore\n");
        assert_eq!(depth, 0);
        assert_eq!(max, 3);
    }

    #[test]
    fn test_comparison_as_value_materializes_zero_one() {
        let unit = prepared(
            "class A { .method f(x.i32, y.i32).V { b.bool := x.i32 <.bool y.i32; ret.V; } }",
        );
        let (out, depth, _) = lower_first(&unit);
        assert_eq!(
            out,
            "\tiload_1\n\tiload_2\n\tif_icmplt TRUE_0\n\ticonst_0\n\tgoto NEXT_0\nTRUE_0:\n\ticonst_1\nNEXT_0:\n\tistore_3\n"
        );
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_negation_as_value_materializes_through_ifeq() {
        let unit = prepared(
            "class A { .method f(b.bool).V { c.bool := !.bool b.bool; ret.V; } }",
        );
        let (out, depth, _) = lower_first(&unit);
        assert_eq!(
            out,
            "\tiload_1\n\tifeq TRUE_0\n\ticonst_0\n\tgoto NEXT_0\nTRUE_0:\n\ticonst_1\nNEXT_0:\n\tistore_2\n"
        );
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_static_invocation_descriptor_and_stack() {
        let unit = prepared(
            "import io.Console; class A { .method f(x.i32).V { invokestatic(Console, \"println\", x.i32).V; ret.V; } }",
        );
        let (out, depth, _) = lower_first(&unit);
        assert_eq!(out, "\tiload_1\n\tinvokestatic io/Console/println(I)V\n");
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_virtual_invocation_pops_receiver_and_args() {
        let unit = prepared(
            "class A { .method f(o.Other, x.i32).V { t0.i32 := invokevirtual(o.Other, \"run\", x.i32).i32; ret.V; } }",
        );
        let method = &unit.methods[0];
        let mut ctx = EmitContext::new(&unit);
        let out = translate_instruction(&mut ctx, method, &method.instructions[0]);
        assert_eq!(
            out,
            "\taload_1\n\tiload_2\n\tinvokevirtual Other/run(I)I\n\tistore_3\n"
        );
        assert_eq!(ctx.stack.depth(), 0);
        assert_eq!(ctx.stack.max(), 2);
    }

    #[test]
    fn test_super_constructor_call_through_this() {
        let unit = prepared(
            "class A extends Base { .construct public A().V { invokespecial(this, \"<init>\").V; ret.V; } }",
        );
        let (out, depth, _) = lower_first(&unit);
        assert_eq!(out, "\taload_0\n\tinvokespecial Base/<init>()V\n");
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_field_round_trip_shares_owner_and_descriptor() {
        let unit = prepared(
            "class A { .field private num.i32; .method f(x.i32).V { \
                putfield(this, num.i32, x.i32).V; \
                t0.i32 := getfield(this, num.i32).i32; \
                ret.V; } }",
        );
        let method = &unit.methods[0];
        let mut ctx = EmitContext::new(&unit);
        let write = translate_instruction(&mut ctx, method, &method.instructions[0]);
        let read = translate_instruction(&mut ctx, method, &method.instructions[1]);
        assert!(write.contains("\tputfield A/num I\n"), "got: {}", write);
        assert!(read.contains("\tgetfield A/num I\n"), "got: {}", read);
    }

    #[test]
    fn test_object_allocation_pushes_one() {
        let unit = prepared(
            "class A { .method f().V { t0.Other := new(Other).Other; ret.V; } }",
        );
        let (out, depth, max) = lower_first(&unit);
        assert_eq!(out, "\tnew Other\n\tastore_1\n");
        assert_eq!(depth, 0);
        assert_eq!(max, 1);
    }

    #[test]
    fn test_array_allocation_keeps_size_slot() {
        let unit = prepared(
            "class A { .method f(n.i32).V { a.array.i32 := new(array, n.i32).array.i32; ret.V; } }",
        );
        let (out, depth, max) = lower_first(&unit);
        assert_eq!(out, "\tiload_1\n\tnewarray int\n\tastore_2\n");
        assert_eq!(depth, 0);
        assert_eq!(max, 1);
    }

    #[test]
    fn test_array_length_swaps_reference_for_length() {
        let unit = prepared(
            "class A { .method f(a.array.i32).V { n.i32 := arraylength(a.array.i32).i32; ret.V; } }",
        );
        let (out, depth, _) = lower_first(&unit);
        assert_eq!(out, "\taload_1\n\tarraylength\n\tistore_2\n");
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_return_opcode_follows_value_type() {
        let unit = prepared("class A { .method f(s.String).String { ret.String s.String; } }");
        let (out, _, _) = lower_first(&unit);
        assert_eq!(out, "\taload_1\n\tareturn\n");

        let unit = prepared("class A { .method f(x.i32).i32 { ret.i32 x.i32; } }");
        let (out, _, _) = lower_first(&unit);
        assert_eq!(out, "\tiload_1\n\tireturn\n");
    }
}
