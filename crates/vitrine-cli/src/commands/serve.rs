//! The serve command.
//!
//! Orchestrates the dev server lifecycle:
//! - Configuration loading and validation
//! - Built-in directory materialization
//! - HTTP server with live reload
//! - File watching and reload broadcasts
//! - Graceful shutdown on Ctrl+C

use crate::builtin;
use crate::cli::Cli;
use crate::config::VitrineConfig;
use crate::dev::{DevConfig, DevEvent, DevServer, DevServerState, FileChange, FileWatcher, SharedState};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use vitrine_core::DESCRIPTOR_FILE;

/// Execute the serve command.
///
/// # Process Flow
///
/// 1. Resolve the component directory and load configuration
/// 2. Prepare the built-in directory
/// 3. Start the HTTP server
/// 4. Watch both roots and broadcast reload events until Ctrl+C
pub async fn execute(args: Cli) -> Result<()> {
    let project_dir = resolve_project_dir(&args.dir)?;
    let config = VitrineConfig::load(&args)?;

    let builtin_dir = match &config.builtin_dir {
        Some(dir) if dir.is_dir() => dir.clone(),
        Some(dir) => return Err(CliError::FileNotFound(dir.clone())),
        None => builtin::materialize(&builtin::default_dir())
            .with_hint("Set builtinDir in vitrine.config.json to a writable directory")?,
    };

    if !project_dir.join(DESCRIPTOR_FILE).is_file() {
        ui::warning(&format!(
            "No {} in {}; the preview page will show a configuration error",
            DESCRIPTOR_FILE,
            project_dir.display()
        ));
    }

    let dev_config = DevConfig::new(&config, project_dir.clone(), builtin_dir.clone(), !args.no_watch)?;
    let state: SharedState = Arc::new(DevServerState::from_config(&config, project_dir, builtin_dir));

    ui::info(&format!("Serving {}", dev_config.project_dir.display()));
    tracing::debug!(builtin = %dev_config.builtin_dir.display(), "built-in directory");

    // Keep the watcher alive for the whole session
    let (watcher, mut change_rx) = if dev_config.watch_enabled {
        let (watcher, rx) = FileWatcher::new(
            dev_config.watch_roots(),
            dev_config.watch.ignore.clone(),
            dev_config.watch.debounce_ms,
        )?;
        for root in watcher.roots() {
            ui::info(&format!("Watching for changes in: {}", root.display()));
        }
        (Some(watcher), rx)
    } else {
        let (_, rx) = mpsc::channel(1);
        (None, rx)
    };

    let server_url = dev_config.server_url();
    let open = dev_config.open;
    let server = DevServer::new(dev_config, state.clone());
    let mut server_handle = tokio::spawn(server.start());

    ui::success(&format!("Preview running at {}", server_url));
    if open {
        open_browser(&server_url);
    }
    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(change) = change_rx.recv() => {
                handle_file_change(change, watcher.as_ref(), &state).await;
            }

            _ = signal::ctrl_c() => {
                ui::info("Shutting down...");
                break;
            }

            result = &mut server_handle => {
                return match result {
                    Ok(Ok(())) => {
                        ui::warning("Server task completed unexpectedly");
                        Ok(())
                    }
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(CliError::Server(format!("Server task failed: {}", e))),
                };
            }
        }
    }

    server_handle.abort();
    ui::success("Server stopped");
    Ok(())
}

/// The component directory as an absolute path.
fn resolve_project_dir(dir: &Path) -> Result<PathBuf> {
    let absolute = std::fs::canonicalize(dir).with_path(dir)?;
    if !absolute.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    Ok(absolute)
}

/// Broadcast the event a file change calls for.
async fn handle_file_change(change: FileChange, watcher: Option<&FileWatcher>, state: &SharedState) {
    let event = reload_event(&change, watcher);
    tracing::debug!(path = %change.path().display(), ?event, "file changed");
    ui::info(&format!("File changed: {}", change.path().display()));
    state.broadcast(&event).await;
}

fn reload_event(change: &FileChange, watcher: Option<&FileWatcher>) -> DevEvent {
    match watcher {
        Some(watcher) if change.is_stylesheet() && !matches!(change, FileChange::Removed(_)) => {
            DevEvent::StyleChanged {
                path: watcher.url_path(change.path()),
            }
        }
        _ => DevEvent::Reload,
    }
}

/// Open the server URL in the default browser.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory() {
        let err = resolve_project_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("package.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(matches!(
            resolve_project_dir(&file).unwrap_err(),
            CliError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_reload_event_for_changes() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let (watcher, _rx) = FileWatcher::new(vec![root.clone()], vec![], 10).unwrap();

        let css = FileChange::Modified(root.join("index.css"));
        assert_eq!(
            reload_event(&css, Some(&watcher)),
            DevEvent::StyleChanged {
                path: "/index.css".to_string()
            }
        );

        let js = FileChange::Modified(root.join("example.js"));
        assert_eq!(reload_event(&js, Some(&watcher)), DevEvent::Reload);

        let removed = FileChange::Removed(root.join("index.css"));
        assert_eq!(reload_event(&removed, Some(&watcher)), DevEvent::Reload);
    }
}
