//! Jasmin code generation from the IR
//!
//! Translates one [`ClassUnit`](crate::ir::ClassUnit) into Jasmin assembly
//! text. Emission is two-phase per method: the body is produced first,
//! updating the stack tracker as a side effect, then the
//! `.limit stack` / `.limit locals` header is assembled from what the body
//! observed.
//!
//! Translation never aborts on an unsupported construct: the offending
//! fragment is replaced by an inline marker (see [`UNSUPPORTED_MARKER`]) and
//! the rest of the class is still produced. Callers that need to detect an
//! incomplete translation scan the output for the marker.

pub mod branch;
pub mod class;
pub mod context;
pub mod descriptor;
pub mod instruction;
pub mod limits;
pub mod loader;
pub mod method;

pub use class::emit_class;
pub use context::EmitContext;
pub use limits::{locals_limit, StackTracker};

/// Prefix of the inline marker emitted for constructs with no lowering rule
pub const UNSUPPORTED_MARKER: &str = "<unsupported";

/// One marker line replacing an unproducible fragment
pub(crate) fn unsupported(what: impl AsRef<str>) -> String {
    format!("\t{} {}>\n", UNSUPPORTED_MARKER, what.as_ref())
}
