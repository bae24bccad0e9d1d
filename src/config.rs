use std::path::PathBuf;

/// Options controlling a compilation run
#[derive(Debug, Clone)]
pub struct Config {
    /// Print the parsed IR and the generated Jasmin text to stderr
    pub debug: bool,
    /// Directory where `.j` files are written by `compile_to_file`
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            output_dir: PathBuf::from("."),
        }
    }
}
