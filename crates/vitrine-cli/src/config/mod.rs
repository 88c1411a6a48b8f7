//! Configuration for the vitrine dev server.
//!
//! Merges settings from CLI args, environment variables, and a config file.
//! Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use vitrine_style::StyleOptions;

pub use defaults::*;
pub use loading::CONFIG_FILE;

use crate::error::{ConfigError, Result};

/// vitrine configuration - loaded from vitrine.config.json, env and CLI args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitrineConfig {
    /// Preferred port
    pub port: u16,

    /// Bind address
    pub host: String,

    /// Open a browser once the server is listening
    pub open: bool,

    /// Key of the dev server block in package.json
    pub descriptor_key: String,

    /// Directory names that hold installed third-party packages
    pub vendor_dirs: Vec<String>,

    /// Stylesheet compilation
    pub style: StyleOptions,

    /// Server-side render subprocess
    pub render: RenderConfig,

    /// File watching
    pub watch: WatchConfig,

    /// Use this directory instead of the embedded built-in files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_dir: Option<PathBuf>,
}

/// Settings of the render subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Node.js executable
    pub node: String,

    /// Hard limit for one render, in milliseconds
    pub timeout_ms: u64,
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Settings of the file watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchConfig {
    /// Quiet period before a change is broadcast
    pub debounce_ms: u64,

    /// Ignored path patterns (`name`, `*.ext` or `dir/`)
    pub ignore: Vec<String>,
}

impl Default for VitrineConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            open: false,
            descriptor_key: default_descriptor_key(),
            vendor_dirs: default_vendor_dirs(),
            style: StyleOptions::default(),
            render: RenderConfig::default(),
            watch: WatchConfig::default(),
            builtin_dir: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            timeout_ms: default_render_timeout_ms(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            ignore: default_ignore_patterns(),
        }
    }
}

impl VitrineConfig {
    /// Reject values the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("host", &self.host, "Use an address such as 127.0.0.1"));
        }
        if self.descriptor_key.trim().is_empty() {
            return Err(invalid(
                "descriptorKey",
                &self.descriptor_key,
                "Name the package.json block, e.g. \"component-devserver\"",
            ));
        }
        if self.vendor_dirs.iter().any(|d| d.trim().is_empty() || d.contains('/')) {
            return Err(invalid(
                "vendorDirs",
                &format!("{:?}", self.vendor_dirs),
                "Entries are single directory names such as \"node_modules\"",
            ));
        }
        if self.render.node.trim().is_empty() {
            return Err(invalid("render.node", &self.render.node, "Path to the node executable"));
        }
        if self.render.timeout_ms == 0 {
            return Err(invalid(
                "render.timeoutMs",
                "0",
                "The render timeout must be at least 1 millisecond",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &str, hint: &str) -> crate::error::CliError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        hint: hint.to_string(),
    }
    .into()
}
