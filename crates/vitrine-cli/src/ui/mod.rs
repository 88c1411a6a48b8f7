//! Terminal status messages.
//!
//! Human-facing lines (server URL, watched directories, reloads) go to
//! stderr with a colored marker. Structured diagnostics go through
//! `tracing` instead.

mod messages;

pub use messages::{error, info, success, warning};

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR, then falls back to terminal detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize color support based on environment.
///
/// Colors are decided per process from the environment; `console` does the
/// terminal detection.
pub fn init_colors() {
    console::set_colors_enabled_stderr(should_use_color());
}
