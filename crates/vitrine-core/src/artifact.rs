//! Handler results.

use serde::Serialize;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_CSS: &str = "text/css";
pub const CONTENT_TYPE_JS: &str = "application/javascript";

/// Compiled response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(content_type: &'static str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn html(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(CONTENT_TYPE_HTML, bytes)
    }

    pub fn css(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(CONTENT_TYPE_CSS, bytes)
    }
}

/// Success payload or failure. Created per request, never cached.
pub type CompiledArtifact = Result<Artifact, CompilationFailure>;

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or malformed descriptor configuration.
    Configuration,
    /// Style, transpile or bundle error.
    Compilation,
    /// The example threw, timed out or could not be evaluated.
    Render,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Configuration => write!(f, "ConfigurationError"),
            FailureKind::Compilation => write!(f, "CompilationFailure"),
            FailureKind::Render => write!(f, "RenderFailure"),
        }
    }
}

/// A handler failure: message plus optional stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompilationFailure {
    pub kind: FailureKind,
    pub message: String,
    pub stack: Option<String>,
}

impl CompilationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind,
            message: if message.trim().is_empty() {
                format!("{kind} without a message")
            } else {
                message
            },
            stack: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message)
    }

    pub fn compilation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Compilation, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Render, message)
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        let stack = stack.into();
        if !stack.trim().is_empty() {
            self.stack = Some(stack);
        }
        self
    }

    /// Plain text response body: the message, then the stack if any.
    pub fn body(&self) -> String {
        match &self.stack {
            Some(stack) if !stack.contains(&self.message) => {
                format!("{}\n\n{}\n", self.message, stack)
            }
            Some(stack) => format!("{stack}\n"),
            None => format!("{}\n", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_without_stack() {
        let failure = CompilationFailure::compilation("Unexpected token");
        assert_eq!(failure.body(), "Unexpected token\n");
    }

    #[test]
    fn test_body_with_stack() {
        let failure =
            CompilationFailure::render("boom").with_stack("at Example (example.js:3:9)");
        assert_eq!(failure.body(), "boom\n\nat Example (example.js:3:9)\n");
    }

    #[test]
    fn test_body_does_not_repeat_message_already_in_stack() {
        let failure = CompilationFailure::render("Error: boom")
            .with_stack("Error: boom\n    at Example (example.js:3:9)");
        assert_eq!(failure.body().matches("Error: boom").count(), 1);
    }

    #[test]
    fn test_empty_message_is_replaced() {
        let failure = CompilationFailure::compilation("");
        assert!(!failure.message.is_empty());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FailureKind::Configuration.to_string(), "ConfigurationError");
        assert_eq!(FailureKind::Render.to_string(), "RenderFailure");
    }

    #[test]
    fn test_content_types() {
        assert_eq!(Artifact::css("a{}").content_type, "text/css");
        assert!(Artifact::html("<p>").content_type.starts_with("text/html"));
    }
}
