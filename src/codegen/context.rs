//! Per-class emission state
//!
//! Everything mutable during translation lives here, created fresh for each
//! [`ClassUnit`] translation. Repeated or concurrent runs in one process
//! therefore cannot interfere with each other.

use super::descriptor;
use super::limits::StackTracker;
use crate::ir::ClassUnit;

/// Mutable state threaded through every lowering call
pub struct EmitContext<'a> {
    pub unit: &'a ClassUnit,
    /// Resolved superclass path, `java/lang/Object` when none is declared
    pub super_name: String,
    /// Operand-stack accounting, reset at each method entry
    pub stack: StackTracker,
    /// Label counter for boolean materialization, unique across the class
    label_seq: u32,
}

impl<'a> EmitContext<'a> {
    pub fn new(unit: &'a ClassUnit) -> Self {
        Self {
            unit,
            super_name: descriptor::resolve_super(unit),
            stack: StackTracker::new(),
            label_seq: 0,
        }
    }

    /// Next unique id for a TRUE/NEXT label pair. Not reset between
    /// methods, so generated labels never collide within the class.
    pub fn next_label(&mut self) -> u32 {
        let id = self.label_seq;
        self.label_seq += 1;
        id
    }
}
