//! Conditional-jump selection
//!
//! Picks the cheapest encoding for a branch condition. Comparisons against
//! a zero literal use the single-operand `if<cond>` opcodes and push only
//! the non-zero side; everything without a shortcut is evaluated to a real
//! 0/1 value and tested with `ifne`. The two-operand `if_icmp*` forms are
//! the fallback when both sides must be pushed.

use super::context::EmitContext;
use super::instruction::translate_instruction;
use super::loader::load_element;
use crate::ir::{Instruction, Method, Operation};

/// Emit code testing `condition` and jumping to `target` when it holds
pub fn lower_condition(
    ctx: &mut EmitContext,
    method: &Method,
    condition: &Instruction,
    target: &str,
) -> String {
    match condition {
        // `!x` branches on x == 0 directly, no materialization
        Instruction::UnaryOp {
            op: Operation::Not,
            operand,
            ..
        } => {
            let mut out = load_element(ctx, method, operand);
            out.push_str(&jump(ctx, "ifeq", target, -1));
            out
        }
        Instruction::BinaryOp {
            op: Operation::LessThan,
            left,
            right,
            ..
        } => {
            if left.is_zero_literal() {
                // 0 < x  ==  x > 0
                let mut out = load_element(ctx, method, right);
                out.push_str(&jump(ctx, "ifgt", target, -1));
                out
            } else if right.is_zero_literal() {
                let mut out = load_element(ctx, method, left);
                out.push_str(&jump(ctx, "iflt", target, -1));
                out
            } else {
                let mut out = load_element(ctx, method, left);
                out.push_str(&load_element(ctx, method, right));
                out.push_str(&jump(ctx, "if_icmplt", target, -2));
                out
            }
        }
        Instruction::BinaryOp {
            op: Operation::GreaterOrEqual,
            left,
            right,
            ..
        } => {
            if left.is_zero_literal() {
                // 0 >= x  ==  x <= 0
                let mut out = load_element(ctx, method, right);
                out.push_str(&jump(ctx, "ifle", target, -1));
                out
            } else if right.is_zero_literal() {
                let mut out = load_element(ctx, method, left);
                out.push_str(&jump(ctx, "ifge", target, -1));
                out
            } else {
                let mut out = load_element(ctx, method, left);
                out.push_str(&load_element(ctx, method, right));
                out.push_str(&jump(ctx, "if_icmpge", target, -2));
                out
            }
        }
        Instruction::BinaryOp {
            op: Operation::LessOrEqual,
            left,
            right,
            ..
        } => {
            if left.is_zero_literal() {
                let mut out = load_element(ctx, method, right);
                out.push_str(&jump(ctx, "ifle", target, -1));
                out
            } else {
                let mut out = load_element(ctx, method, left);
                out.push_str(&load_element(ctx, method, right));
                out.push_str(&jump(ctx, "if_icmple", target, -2));
                out
            }
        }
        // `a && b` and everything else: evaluate to a 0/1 value, test it
        _ => {
            let mut out = translate_instruction(ctx, method, condition);
            out.push_str(&jump(ctx, "ifne", target, -1));
            out
        }
    }
}

fn jump(ctx: &mut EmitContext, opcode: &str, target: &str, delta: i32) -> String {
    ctx.stack.adjust(delta);
    format!("\t{} {}\n", opcode, target)
}
