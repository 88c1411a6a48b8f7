//! Server-side rendering of the example in a Node.js subprocess.
//!
//! The example is bundled to CommonJS and piped into `node`, which evaluates
//! it, renders the exported component with the project's own `react-dom`
//! and prints the markup. The child gets a hard deadline and is killed when
//! it passes.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use vitrine_core::CompilationFailure;

const HARNESS: &str = include_str!("../../assets/render-harness.js");

/// Runs render bundles in a child process.
#[derive(Debug, Clone)]
pub struct RenderSandbox {
    node: String,
    timeout: Duration,
}

impl RenderSandbox {
    pub fn new(node: impl Into<String>, timeout: Duration) -> Self {
        Self {
            node: node.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Evaluate `bundle` as the module at `example` and return its markup.
    ///
    /// Bare imports in the bundle resolve from `project_dir`.
    pub async fn render(
        &self,
        bundle: String,
        example: &Path,
        project_dir: &Path,
    ) -> Result<String, CompilationFailure> {
        let mut child = Command::new(&self.node)
            .arg("-e")
            .arg(HARNESS)
            .arg(example)
            .arg(project_dir)
            .current_dir(project_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CompilationFailure::render(format!("Failed to start '{}': {e}", self.node))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            tokio::spawn(async move {
                // The child may exit before reading everything.
                let _ = stdin.write_all(bundle.as_bytes()).await;
            });
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                CompilationFailure::render(format!("Render process failed: {e}"))
            })?,
            Err(_) => {
                tracing::warn!(
                    example = %example.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "render timed out, child killed"
                );
                return Err(CompilationFailure::render(format!(
                    "Rendering {} timed out after {}ms",
                    example.display(),
                    self.timeout.as_millis()
                )));
            }
        };

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = stderr
            .lines()
            .next()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Render process exited with {}", output.status));

        Err(CompilationFailure::render(message).with_stack(stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitrine_core::FailureKind;

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let sandbox = RenderSandbox::new("vitrine-no-such-node", Duration::from_secs(1));
        let temp = TempDir::new().unwrap();
        let err = sandbox
            .render(String::new(), &temp.path().join("example.js"), temp.path())
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Render);
        assert!(err.message.contains("vitrine-no-such-node"));
    }

    #[tokio::test]
    async fn test_thrown_error_is_render_failure() {
        if !node_available() {
            eprintln!("Skipping test_thrown_error_is_render_failure: node not found");
            return;
        }
        let temp = TempDir::new().unwrap();
        let sandbox = RenderSandbox::new("node", Duration::from_secs(10));
        let err = sandbox
            .render(
                "throw new Error('example exploded');".to_string(),
                &temp.path().join("example.js"),
                temp.path(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Render);
        assert!(err.message.contains("example exploded"));
        assert!(err.stack.unwrap().contains("example.js"));
    }

    #[tokio::test]
    async fn test_hanging_example_times_out() {
        if !node_available() {
            eprintln!("Skipping test_hanging_example_times_out: node not found");
            return;
        }
        let temp = TempDir::new().unwrap();
        let sandbox = RenderSandbox::new("node", Duration::from_millis(300));
        let started = std::time::Instant::now();
        let err = sandbox
            .render(
                "for (;;) {}".to_string(),
                &temp.path().join("example.js"),
                temp.path(),
            )
            .await
            .unwrap_err();
        assert!(err.message.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
