//! mdpp CLI - Markdown++ preprocessor.
//!
//! Provides commands for:
//! - `validate`: Check documents for directive errors
//! - `expand`: Resolve includes and print the expanded document
//! - `add-aliases`: Insert generated alias anchors before headings
//!
//! Exit codes: 0 on success, 1 on file or configuration errors, 2 on usage
//! errors, 3 when validation errors are found.

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AddAliasesArgs, ExpandArgs, ValidateArgs};
use output::Output;

/// Application version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// mdpp - Markdown++ preprocessor.
#[derive(Parser)]
#[command(name = "mdpp", version = VERSION, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate documents and report diagnostics.
    Validate(ValidateArgs),
    /// Resolve includes and write the expanded document.
    Expand(ExpandArgs),
    /// Insert generated alias anchors before headings.
    AddAliases(AddAliasesArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Validate(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate(args) => args.execute(),
        Commands::Expand(args) => args.execute(),
        Commands::AddAliases(args) => args.execute(),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            output.error(&format!("Error: {err}"));
            std::process::exit(1);
        }
    }
}
