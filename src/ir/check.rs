//! Label-consistency validation
//!
//! Runs before the backend: every jump must target a declared label and
//! every label must mark a real instruction position. A failure here is a
//! generation-stage error and the backend is never entered.

use std::collections::HashSet;

use super::{ClassUnit, Instruction, Method};
use crate::error::{Error, Result};

/// Validate the label tables of every method in the unit
pub fn check_labels(unit: &ClassUnit) -> Result<()> {
    for method in &unit.methods {
        check_method(unit, method)?;
    }
    Ok(())
}

fn check_method(unit: &ClassUnit, method: &Method) -> Result<()> {
    let mut declared = HashSet::new();
    for label in &method.labels {
        if !declared.insert(label.name.as_str()) {
            return Err(Error::codegen_error(format!(
                "{}.{}: duplicate label '{}'",
                unit.name, method.name, label.name
            )));
        }
        if label.target >= method.instructions.len() {
            return Err(Error::codegen_error(format!(
                "{}.{}: label '{}' marks position {} but the method has {} instructions",
                unit.name,
                method.name,
                label.name,
                label.target,
                method.instructions.len()
            )));
        }
    }

    for instruction in &method.instructions {
        check_jump_targets(unit, method, instruction, &declared)?;
    }
    Ok(())
}

fn check_jump_targets(
    unit: &ClassUnit,
    method: &Method,
    instruction: &Instruction,
    declared: &HashSet<&str>,
) -> Result<()> {
    match instruction {
        Instruction::Goto { label } => require_declared(unit, method, label, declared),
        Instruction::Branch { condition, label } => {
            require_declared(unit, method, label, declared)?;
            check_jump_targets(unit, method, condition, declared)
        }
        Instruction::Assign { rhs, .. } => check_jump_targets(unit, method, rhs, declared),
        _ => Ok(()),
    }
}

fn require_declared(
    unit: &ClassUnit,
    method: &Method,
    label: &str,
    declared: &HashSet<&str>,
) -> Result<()> {
    if !declared.contains(label) {
        return Err(Error::codegen_error(format!(
            "{}.{}: jump to undeclared label '{}'",
            unit.name, method.name, label
        )));
    }
    Ok(())
}
