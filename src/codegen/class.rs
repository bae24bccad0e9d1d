//! Class emission
//!
//! Produces the class header, one `.field` line per field and one method
//! block per method. All translation state lives in the [`EmitContext`]
//! created here, never in process-wide storage.

use super::context::EmitContext;
use super::descriptor::descriptor;
use super::method::emit_method;
use crate::ir::{AccessLevel, ClassUnit, Field};

/// Translate one class unit into Jasmin text
pub fn emit_class(unit: &ClassUnit) -> String {
    let mut ctx = EmitContext::new(unit);

    let mut out = format!(".class public {}\n", unit.name);
    out.push_str(&format!(".super {}\n\n", ctx.super_name));

    for field in &unit.fields {
        out.push_str(&emit_field(&ctx, field));
    }
    if !unit.fields.is_empty() {
        out.push('\n');
    }

    for method in &unit.methods {
        let text = emit_method(&mut ctx, method);
        out.push_str(&text);
    }
    out
}

fn emit_field(ctx: &EmitContext, field: &Field) -> String {
    let mut out = String::from(".field ");
    if field.access != AccessLevel::Default {
        out.push_str(field.access.keyword());
        out.push(' ');
    }
    if field.is_static {
        out.push_str("static ");
    }
    if field.is_final {
        out.push_str("final ");
    }
    out.push_str(&field.name);
    out.push(' ');
    out.push_str(&descriptor(&field.ty, ctx.unit));
    if let Some(value) = &field.initial_value {
        out.push_str(&format!(" = {}", value));
    }
    out.push('\n');
    out
}
