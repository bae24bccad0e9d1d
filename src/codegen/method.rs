//! Method emission
//!
//! A method's limits are only known after its body has been produced, so
//! emission is two-phase: translate every instruction while the stack
//! tracker runs, then prepend the `.limit` lines read back from it.

use super::context::EmitContext;
use super::descriptor::descriptor;
use super::instruction::translate_instruction;
use super::limits::locals_limit;
use crate::ir::{AccessLevel, Instruction, Method};

/// Emit one `.method … .end method` block
pub fn emit_method(ctx: &mut EmitContext, method: &Method) -> String {
    let mut out = String::from(".method ");
    if method.access != AccessLevel::Default {
        out.push_str(method.access.keyword());
        out.push(' ');
    }
    if method.is_static {
        out.push_str("static ");
    }
    if method.is_final {
        out.push_str("final ");
    }
    if method.is_constructor {
        out.push_str("<init>");
    } else {
        out.push_str(&method.name);
    }
    out.push('(');
    for param in &method.params {
        out.push_str(&descriptor(&param.ty, ctx.unit));
    }
    out.push(')');
    out.push_str(&descriptor(&method.return_type, ctx.unit));
    out.push('\n');

    ctx.stack.reset();
    let body = emit_body(ctx, method);

    out.push_str(&format!("\t.limit stack {}\n", ctx.stack.max()));
    out.push_str(&format!("\t.limit locals {}\n", locals_limit(method)));
    out.push_str(&body);
    out.push_str(".end method\n\n");
    out
}

fn emit_body(ctx: &mut EmitContext, method: &Method) -> String {
    let mut body = String::new();
    for (index, instruction) in method.instructions.iter().enumerate() {
        for label in method.labels_at(index) {
            body.push_str(&format!("{}:\n", label.name));
        }
        body.push_str(&translate_instruction(ctx, method, instruction));

        // A bare call that leaves a value must not grow the stack
        if let Instruction::Call(call) = instruction {
            if !call.return_type.is_void() {
                body.push_str("\tpop\n");
                ctx.stack.adjust(-1);
            }
        }
    }

    if needs_trailing_return(method) {
        body.push_str("\treturn\n");
    }
    body
}

/// A void method whose instruction list does not end in an explicit return
/// gets exactly one appended
fn needs_trailing_return(method: &Method) -> bool {
    method.return_type.is_void()
        && !matches!(method.instructions.last(), Some(Instruction::Return { .. }))
}
