//! Jasmin backend for a restricted Java IR (jasmc)
//!
//! Compiles a textual three-address IR for a restricted Java-like language
//! into Jasmin stack-machine assembly.
//!
//! ## Architecture
//!
//! - **ir**: data model, lexer/parser for the textual IR, pretty-printer
//! - **ir::check / ir::vartable**: validation passes that must succeed
//!   before code generation (label consistency, slot assignment)
//! - **codegen**: IR to Jasmin translation with computed
//!   `.limit stack` / `.limit locals`
//! - **bin**: command-line interface
//!
//! ## Compilation flow
//!
//! ```text
//! IR text → Parser → ClassUnit → check/vartable → Codegen → Jasmin text
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;

pub use config::Config;
pub use error::{Error, Result};

use std::fs;
use std::path::PathBuf;

/// Compile IR text to Jasmin text
///
/// Runs the full pipeline: parse, validate labels, assign slots, emit.
/// Any stage failure halts the pipeline before the next stage runs; the
/// backend itself never fails but may embed
/// [`codegen::UNSUPPORTED_MARKER`] fragments in its output.
pub fn compile(source: &str, config: &Config) -> Result<String> {
    let unit = prepare(source, config)?;
    let jasmin = codegen::emit_class(&unit);
    if config.debug {
        eprintln!("jasmc: generated Jasmin for {}:\n{}", unit.name, jasmin);
    }
    Ok(jasmin)
}

/// Compile IR text and write `<ClassName>.j` into the configured directory
///
/// Returns the path of the written file.
pub fn compile_to_file(source: &str, config: &Config) -> Result<PathBuf> {
    let unit = prepare(source, config)?;
    let jasmin = codegen::emit_class(&unit);

    if !config.output_dir.exists() {
        fs::create_dir_all(&config.output_dir)?;
    }
    let path = config.output_dir.join(format!("{}.j", unit.name));
    fs::write(&path, jasmin)?;
    Ok(path)
}

/// Parse and validate one unit, producing a ClassUnit ready for the backend
pub fn prepare(source: &str, config: &Config) -> Result<ir::ClassUnit> {
    let mut unit = ir::parse_unit(source)?;
    ir::check::check_labels(&unit)?;
    ir::vartable::build_var_tables(&mut unit);
    if config.debug {
        eprintln!("jasmc: parsed IR:\n{}", unit);
    }
    Ok(unit)
}
