//! Command-line interface definition for vitrine.
//!
//! There is one entry point: `vitrine [OPTIONS] <DIR>` serves the component
//! in `DIR` until interrupted.


use clap::Parser;
use std::path::PathBuf;

/// vitrine - preview a single UI component in isolation
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vitrine",
    version,
    about = "Preview a single UI component in isolation",
    long_about = "vitrine serves a component directory as a live preview page.\n\
                  The page shows a server-side render of the example, its highlighted\n\
                  source and the readme. Stylesheets and scripts are compiled on\n\
                  request and the page reloads when files change."
)]
pub struct Cli {
    /// Component directory (must contain package.json)
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Port to listen on (the next free port is used when busy)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Open the preview in a browser once the server is up
    #[arg(long)]
    pub open: bool,

    /// Path to a vitrine.config.json file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not watch files for changes
    #[arg(long)]
    pub no_watch: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
