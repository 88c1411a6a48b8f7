//! The built-in directory: default template, readme and shared scripts.
//!
//! The files are embedded in the binary and written to a per-version
//! directory on start, which becomes the last root of the RootSet. Files are
//! only rewritten when their content differs, so a running watcher does not
//! see spurious changes.

use crate::error::{Result, ResultExt};
use rust_embed::RustEmbed;
use std::path::{Path, PathBuf};

#[derive(RustEmbed)]
#[folder = "assets/builtin"]
struct BuiltinAssets;

/// Default location of the materialized built-in directory.
pub fn default_dir() -> PathBuf {
    std::env::temp_dir().join(format!("vitrine-{}", env!("CARGO_PKG_VERSION")))
}

/// Write the embedded files into `dir` and return it.
pub fn materialize(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_path(dir)?;

    let mut written = 0usize;
    for name in BuiltinAssets::iter() {
        let Some(file) = BuiltinAssets::get(&name) else {
            continue;
        };
        let target = dir.join(name.as_ref());
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).with_path(parent)?;
        }

        let unchanged = std::fs::read(&target)
            .map(|existing| existing == file.data.as_ref())
            .unwrap_or(false);
        if !unchanged {
            std::fs::write(&target, file.data.as_ref()).with_path(&target)?;
            written += 1;
        }
    }

    tracing::debug!(dir = %dir.display(), written, "built-in directory ready");
    Ok(dir.to_path_buf())
}

/// Names of all embedded files.
pub fn file_names() -> Vec<String> {
    BuiltinAssets::iter().map(|name| name.to_string()).collect()
}
