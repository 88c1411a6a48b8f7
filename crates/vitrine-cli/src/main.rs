//! vitrine - preview a single UI component in isolation.
//!
//! This is the main entry point for the vitrine CLI. It handles command-line
//! argument parsing, logging initialization, and starting the server.

use clap::Parser;
use miette::Result;
use vitrine_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging and colors based on global flags
    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors();

    let result = commands::serve_execute(args).await;

    // Convert CLI errors to miette diagnostics for error reporting
    result.map_err(error::cli_error_to_miette)
}
