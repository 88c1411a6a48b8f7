//! vitrine - a local dev server that previews a single UI component.
//!
//! Point it at a component directory and it serves:
//!
//! - `/` - a page with the server-rendered example, its highlighted source
//!   and the readme
//! - `*.css` - stylesheets compiled on request
//! - `*.js` / `*.es6` - module bundles built on request, streamed
//!
//! Everything else is served as static files from the project directory,
//! then from the built-in directory. Pages reload when files change.
//!
//! # Architecture
//!
//! - [`cli`] - argument parsing
//! - [`config`] - layered configuration (defaults, file, environment, CLI)
//! - [`dev`] - the HTTP server, request dispatcher, live reload and watcher
//! - [`document`] - the document page: highlighting, rendering, templating
//! - [`builtin`] - assets shipped inside the binary
//! - [`error`] - CLI error types
//! - [`logger`] - tracing setup
//! - [`ui`] - terminal status messages
//!
//! # Example
//!
//! ```rust,no_run
//! use vitrine_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod builtin;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod document;
pub mod error;
pub mod logger;
pub mod ui;

// Re-export commonly used types
pub use error::{CliError, ConfigError, Result, ResultExt};
