//! Operand loading
//!
//! Emits the cheapest sequence that pushes one operand's value, and reports
//! +1 to the stack tracker per pushed value. Constant pushes walk the
//! immediate-width ladder: `iconst_*` for [-1, 5], `bipush` for a byte,
//! `sipush` for a short, `ldc` otherwise.

use super::context::EmitContext;
use super::unsupported;
use crate::ir::{Element, Method, Type};

/// Emit code pushing `element`, leaving exactly one value on the stack
pub fn load_element(ctx: &mut EmitContext, method: &Method, element: &Element) -> String {
    match element {
        // Named boolean constants never come from a slot
        Element::Variable { name, .. } if name == "true" => {
            ctx.stack.adjust(1);
            "\ticonst_1\n".to_string()
        }
        Element::Variable { name, .. } if name == "false" => {
            ctx.stack.adjust(1);
            "\ticonst_0\n".to_string()
        }
        Element::Literal { value, ty } if ty.is_integer() => {
            ctx.stack.adjust(1);
            match value.parse::<i64>() {
                Ok(parsed) => push_int(parsed),
                // Not a number; let the constant pool deal with the text
                Err(_) => format!("\tldc {}\n", value),
            }
        }
        Element::Literal { value, .. } => {
            ctx.stack.adjust(1);
            format!("\tldc {}\n", value)
        }
        Element::This => {
            ctx.stack.adjust(1);
            "\taload_0\n".to_string()
        }
        Element::Variable { name, ty } => match var_slot(method, name) {
            Some(slot) => {
                ctx.stack.adjust(1);
                match ty {
                    Type::Int | Type::Bool => format!("\tiload{}\n", slot_suffix(slot)),
                    Type::String | Type::IntArray | Type::Class(_) => {
                        format!("\taload{}\n", slot_suffix(slot))
                    }
                    Type::Void => unsupported(format!("void operand '{}'", name)),
                }
            }
            None => unsupported(format!("variable '{}' has no slot", name)),
        },
        Element::ArrayAccess { name, index, .. } => match var_slot(method, name) {
            Some(slot) => {
                let mut out = format!("\taload{}\n", slot_suffix(slot));
                ctx.stack.adjust(1);
                out.push_str(&load_element(ctx, method, index));
                out.push_str("\tiaload\n");
                ctx.stack.adjust(-1);
                out
            }
            None => unsupported(format!("array '{}' has no slot", name)),
        },
    }
}

/// Constant push for an integer value, by immediate width
fn push_int(value: i64) -> String {
    if value == -1 {
        "\ticonst_m1\n".to_string()
    } else if (0..=5).contains(&value) {
        format!("\ticonst_{}\n", value)
    } else if (-128..=127).contains(&value) {
        format!("\tbipush {}\n", value)
    } else if (-32768..=32767).contains(&value) {
        format!("\tsipush {}\n", value)
    } else {
        format!("\tldc {}\n", value)
    }
}

/// Slot operand spelling: an underscore form below 4, a wide form above
pub(crate) fn slot_suffix(slot: u16) -> String {
    if slot < 4 {
        format!("_{}", slot)
    } else {
        format!(" {}", slot)
    }
}

pub(crate) fn var_slot(method: &Method, name: &str) -> Option<u16> {
    method.var_table.get(name).map(|entry| entry.slot)
}
