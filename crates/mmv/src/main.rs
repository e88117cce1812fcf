//! MMV CLI - Multi-manual documentation viewer.
//!
//! Provides commands for:
//! - `open`: Browse the manuals in an interactive terminal session
//! - `render`: Render one manual into a standalone HTML page

mod commands;
mod error;
mod output;
mod shell;
mod surface;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{OpenArgs, RenderArgs};
use output::Output;

/// MMV - Multi-manual documentation viewer.
#[derive(Parser)]
#[command(name = "mmv", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse manuals interactively.
    Open(OpenArgs),
    /// Render a manual into a standalone HTML page.
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Open(args) => args.source.verbose,
        Commands::Render(args) => args.source.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    let result = match cli.command {
        Commands::Open(args) => rt.block_on(args.execute()),
        Commands::Render(args) => rt.block_on(args.execute()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
