//! Command line interface for assembling, disassembling, and optimizing
//! SPIR-V modules (spec.md §6 "CLI").
//!
//! `spirv-cli as` reads textual assembly on stdin and writes a binary
//! module to stdout; `spirv-cli dis` reads a binary module on stdin and
//! writes textual assembly to stdout. Both accept `--optimize` to run
//! the `spirv-passes` pipeline before writing. Exit code is 0 on success;
//! on a parse or verification error a single `<lineno>: error: <message>`
//! line (binary errors have no source line, so just `error: <message>`)
//! is written to stderr and the process exits non-zero.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use spirv_text::AssembleOptions;

/// Assemble, disassemble, and optimize SPIR-V modules.
#[derive(Parser)]
#[command(name = "spirv-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble textual SPIR-V (stdin) into a binary module (stdout).
    As {
        /// Run the optimization pipeline before emitting binary.
        #[arg(long)]
        optimize: bool,
    },
    /// Disassemble a binary SPIR-V module (stdin) into text (stdout).
    Dis {
        /// Run the optimization pipeline before emitting text.
        #[arg(long)]
        optimize: bool,
        /// Emit the fully explicit raw syntax instead of pretty-printing.
        #[arg(long)]
        raw: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::As { optimize } => run_as(optimize),
        Commands::Dis { optimize, raw } => run_dis(optimize, raw),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run_as(optimize: bool) -> Result<(), String> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).map_err(|e| format!("error: {e}"))?;

    let mut module = spirv_text::assemble(&source, AssembleOptions::DEFAULT_OPTIONS).map_err(|e| e.to_string())?;
    if optimize {
        spirv_passes::optimize(&mut module);
    }
    let bytes = spirv_binary::write_module(&mut module);

    io::stdout().write_all(&bytes).map_err(|e| format!("error: {e}"))?;
    Ok(())
}

fn run_dis(optimize: bool, raw: bool) -> Result<(), String> {
    let mut bytes = Vec::new();
    io::stdin().read_to_end(&mut bytes).map_err(|e| format!("error: {e}"))?;

    let mut module = spirv_binary::read_module(&bytes).map_err(|e| format!("error: {e}"))?;
    if optimize {
        spirv_passes::optimize(&mut module);
    }
    let options = if raw { AssembleOptions::RAW_OPTIONS } else { AssembleOptions::DEFAULT_OPTIONS };
    let text = spirv_text::disassemble(&mut module, options);

    io::stdout().write_all(text.as_bytes()).map_err(|e| format!("error: {e}"))?;
    Ok(())
}
