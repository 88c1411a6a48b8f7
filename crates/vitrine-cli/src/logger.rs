//! Logging infrastructure for the vitrine CLI.
//!
//! Structured logging with the `tracing` ecosystem. Library crates only emit
//! events; this module installs the subscriber.
//!
//! # Example
//!
//! ```rust,no_run
//! use vitrine_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Serving ./my-button");
//! debug!(path = "/index.css", "dispatching");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str =
    "vitrine=debug,vitrine_cli=debug,vitrine_core=debug,vitrine_bundler=debug,vitrine_style=debug";

/// Filter used with `--quiet`.
pub const QUIET_FILTER: &str = "error";

/// Filter used when neither flag nor `RUST_LOG` is set.
pub const DEFAULT_FILTER: &str =
    "vitrine=info,vitrine_cli=info,vitrine_core=info,vitrine_bundler=info,vitrine_style=info";

/// Pick the filter directive for the given flags.
///
/// `--verbose` wins over `--quiet`; `RUST_LOG` applies only when neither is
/// set.
pub fn filter_directive(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some(VERBOSE_FILTER)
    } else if quiet {
        Some(QUIET_FILTER)
    } else {
        None
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at the start of the program, before any logging occurs.
///
/// * `verbose` - debug level for vitrine crates (overrides `quiet`)
/// * `quiet` - errors only
/// * `no_color` - disable ANSI colors
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = match filter_directive(verbose, quiet) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    // try_init: a second call (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Check if colored output should be enabled.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_filter_directive_precedence() {
        assert_eq!(filter_directive(true, true), Some(VERBOSE_FILTER));
        assert_eq!(filter_directive(false, true), Some(QUIET_FILTER));
        assert_eq!(filter_directive(false, false), None);
    }

    #[test]
    fn test_filters_parse() {
        let _ = EnvFilter::new(VERBOSE_FILTER);
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }

    #[test]
    #[serial]
    fn test_should_use_colors_respects_env() {
        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::set_var("FORCE_COLOR", "1");
        }
        assert!(should_use_colors());

        unsafe {
            std::env::set_var("NO_COLOR", "1");
        }
        assert!(!should_use_colors());

        unsafe {
            std::env::remove_var("NO_COLOR");
            std::env::remove_var("FORCE_COLOR");
        }
    }
}
