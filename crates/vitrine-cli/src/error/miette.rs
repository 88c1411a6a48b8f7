//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ConfigError};
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(ConfigError::InvalidValue { field, value, hint }) => {
            miette::miette!(help = hint, "Invalid value for '{}': {}", field, value)
        }
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::FileNotFound(path) => miette::miette!(
            help = "Pass the component directory: vitrine <DIR>",
            "File not found: {}",
            path.display()
        ),
        _ => miette::miette!("{}", err),
    }
}
