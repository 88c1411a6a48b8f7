//! Development server module.
//!
//! Provides the preview server:
//! - Request dispatch to the document, style and module handlers
//! - Static file fallback across the root directories
//! - Live reload via Server-Sent Events
//! - File watching with debouncing

pub mod config;
pub mod dispatch;
pub mod server;
pub mod state;
pub mod watcher;

// Re-exports
pub use config::DevConfig;
pub use server::{DevServer, build_router};
pub use state::{DevServerState, SharedState};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events pushed to connected browsers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    /// Reload the page
    Reload,

    /// A stylesheet changed; refresh stylesheets in place
    StyleChanged { path: String },

    /// A request failed to compile or render
    Failure { path: String, message: String },

    /// Client connected
    ClientConnected { id: usize },

    /// Client disconnected
    ClientDisconnected { id: usize },
}
