use anyhow::Result;
use clap::{Parser, Subcommand};
use jasmc::Config;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jasmc")]
#[command(about = "Jasmin bytecode backend for a restricted Java IR")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an IR file to a Jasmin .j file
    Compile {
        /// Input IR file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory for .j files
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Print the parsed IR and the generated Jasmin text
        #[arg(short, long)]
        debug: bool,
    },

    /// Parse an IR file and print it back
    Parse {
        /// Input IR file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Run the validation passes without generating code
    Check {
        /// Input IR file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Compile { input, output, debug } => {
            compile_file(input, output.as_ref(), *debug)?;
        }
        Commands::Parse { input } => {
            parse_file(input)?;
        }
        Commands::Check { input } => {
            check_file(input)?;
        }
    }

    Ok(())
}

fn compile_file(input: &PathBuf, output: Option<&PathBuf>, debug: bool) -> Result<()> {
    let source = fs::read_to_string(input)?;
    let mut config = Config { debug, ..Config::default() };
    if let Some(dir) = output {
        config.output_dir = dir.clone();
    }
    let path = jasmc::compile_to_file(&source, &config)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn parse_file(input: &PathBuf) -> Result<()> {
    let source = fs::read_to_string(input)?;
    let unit = jasmc::prepare(&source, &Config::default())?;
    println!("{}", unit);
    Ok(())
}

fn check_file(input: &PathBuf) -> Result<()> {
    let source = fs::read_to_string(input)?;
    let unit = jasmc::prepare(&source, &Config::default())?;
    println!("{}: ok", unit.name);
    Ok(())
}
