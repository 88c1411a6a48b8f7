//! File system watcher with debouncing.
//!
//! Watches every root directory and filters changes to relevant files,
//! ignoring vendored packages, hidden files and configured patterns.

use crate::error::{CliError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// File was modified
    Modified(PathBuf),
    /// File was created
    Created(PathBuf),
    /// File was removed
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    pub fn is_stylesheet(&self) -> bool {
        self.path().extension().is_some_and(|ext| ext == "css")
    }
}

/// File watcher with debouncing and filtering.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl FileWatcher {
    /// Watch `roots` recursively.
    ///
    /// # Returns
    ///
    /// Tuple of (FileWatcher, receiver for change events)
    ///
    /// # Errors
    ///
    /// Returns error if watcher cannot be created or a directory doesn't exist
    pub fn new(
        roots: Vec<PathBuf>,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if let Some(missing) = roots.iter().find(|root| !root.exists()) {
            return Err(CliError::FileNotFound(missing.clone()));
        }

        let (tx, rx) = mpsc::channel(100);

        let debounce_duration = Duration::from_millis(debounce_ms);
        let mut last_event: Option<(PathBuf, Instant)> = None;
        let watched = roots.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            for path in &event.paths {
                if Self::should_ignore(path, &watched, &ignore_patterns) {
                    continue;
                }

                // Debounce: skip if same file changed within debounce window
                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce_duration {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let change = match event.kind {
                    notify::EventKind::Create(_) => FileChange::Created(path.clone()),
                    notify::EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    notify::EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };

                let _ = tx.blocking_send(change);
            }
        })?;

        for root in &roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }

        Ok((
            Self {
                _watcher: watcher,
                roots,
            },
            rx,
        ))
    }

    /// Check if a path should be ignored.
    ///
    /// Paths outside every root are always ignored.
    fn should_ignore(path: &Path, roots: &[PathBuf], ignore_patterns: &[String]) -> bool {
        let Some(rel_path) = roots.iter().find_map(|root| path.strip_prefix(root).ok()) else {
            return true;
        };

        let path_str = rel_path.to_string_lossy();

        for pattern in ignore_patterns {
            if let Some(ext) = pattern.strip_prefix('*') {
                if path_str.ends_with(ext) {
                    return true;
                }
            } else if path_str.starts_with(pattern.as_str())
                || path_str.contains(&format!("/{}", pattern))
            {
                return true;
            }
        }

        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }

    /// Directories being watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// URL path of a changed file, relative to the root that holds it.
    pub fn url_path(&self, path: &Path) -> String {
        let relative = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        format!("/{}", relative.to_string_lossy().replace('\\', "/"))
    }
}
