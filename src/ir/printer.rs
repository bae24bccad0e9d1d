//! Textual rendering of the IR, matching the syntax the parser accepts

use std::fmt;

use super::{
    AccessLevel, Call, CallKind, ClassUnit, Element, Field, Instruction, Method, Operation, Type,
};

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "V"),
            Type::Int => write!(f, "i32"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "String"),
            Type::IntArray => write!(f, "array.i32"),
            Type::Class(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Literal { value, ty } => write!(f, "{}.{}", value, ty),
            Element::Variable { name, ty } => write!(f, "{}.{}", name, ty),
            Element::ArrayAccess { name, index, ty } => write!(f, "{}[{}].{}", name, index, ty),
            Element::This => write!(f, "this"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "*",
            Operation::Div => "/",
            Operation::LessThan => "<",
            Operation::GreaterOrEqual => ">=",
            Operation::LessOrEqual => "<=",
            Operation::And => "&&",
            Operation::Not => "!",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CallKind::New => write!(f, "new({}).{}", target_name(&self.target), self.return_type),
            CallKind::ArrayNew => write!(f, "new(array, {}).{}", self.target, self.return_type),
            CallKind::ArrayLength => {
                write!(f, "arraylength({}).{}", self.target, self.return_type)
            }
            CallKind::LoadConstant => write!(f, "ldc({})", self.target),
            CallKind::InvokeStatic => {
                write!(f, "invokestatic({}", target_name(&self.target))?;
                self.fmt_invocation_tail(f)
            }
            CallKind::InvokeSpecial => {
                write!(f, "invokespecial({}", self.target)?;
                self.fmt_invocation_tail(f)
            }
            CallKind::InvokeVirtual => {
                write!(f, "invokevirtual({}", self.target)?;
                self.fmt_invocation_tail(f)
            }
        }
    }
}

impl Call {
    fn fmt_invocation_tail(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ", \"{}\"", self.method.as_deref().unwrap_or(""))?;
        for arg in &self.args {
            write!(f, ", {}", arg)?;
        }
        write!(f, ").{}", self.return_type)
    }
}

/// The bare name of a class operand
fn target_name(target: &Element) -> &str {
    match target {
        Element::Variable { name, .. } => name,
        _ => "this",
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dest, rhs } => write!(f, "{} := {}", dest, rhs),
            Instruction::Call(call) => write!(f, "{}", call),
            Instruction::Goto { label } => write!(f, "goto {}", label),
            Instruction::Branch { condition, label } => {
                write!(f, "if ({}) goto {}", condition, label)
            }
            Instruction::Return { value, ty } => match value {
                Some(v) => write!(f, "ret.{} {}", ty, v),
                None => write!(f, "ret.{}", ty),
            },
            Instruction::GetField {
                receiver,
                field,
                field_type,
            } => write!(f, "getfield({}, {}.{}).{}", receiver, field, field_type, field_type),
            Instruction::PutField {
                receiver,
                field,
                field_type,
                value,
            } => write!(f, "putfield({}, {}.{}, {}).V", receiver, field, field_type, value),
            Instruction::UnaryOp { op, operand, ty } => write!(f, "{}.{} {}", op, ty, operand),
            Instruction::BinaryOp { op, left, right, ty } => {
                write!(f, "{} {}.{} {}", left, op, ty, right)
            }
            Instruction::SingleOperand(element) => write!(f, "{}", element),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".field")?;
        if self.access != AccessLevel::Default {
            write!(f, " {}", self.access.keyword())?;
        }
        if self.is_static {
            write!(f, " static")?;
        }
        if self.is_final {
            write!(f, " final")?;
        }
        write!(f, " {}.{}", self.name, self.ty)?;
        if let Some(value) = &self.initial_value {
            write!(f, " := {}", value)?;
        }
        write!(f, ";")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constructor {
            write!(f, ".construct")?;
        } else {
            write!(f, ".method")?;
        }
        if self.access != AccessLevel::Default {
            write!(f, " {}", self.access.keyword())?;
        }
        if self.is_static {
            write!(f, " static")?;
        }
        if self.is_final {
            write!(f, " final")?;
        }
        write!(f, " {}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}.{}", param.name, param.ty)?;
        }
        writeln!(f, ").{} {{", self.return_type)?;
        for (index, instruction) in self.instructions.iter().enumerate() {
            for label in self.labels_at(index) {
                writeln!(f, "  {}:", label.name)?;
            }
            writeln!(f, "    {};", instruction)?;
        }
        write!(f, "  }}")
    }
}

impl fmt::Display for ClassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "import {};", import)?;
        }
        write!(f, "class {}", self.name)?;
        if let Some(super_class) = &self.super_class {
            write!(f, " extends {}", super_class)?;
        }
        writeln!(f, " {{")?;
        for field in &self.fields {
            writeln!(f, "  {}", field)?;
        }
        for method in &self.methods {
            writeln!(f, "  {}", method)?;
        }
        write!(f, "}}")
    }
}
