//! # vitrine-bundler
//!
//! On-demand module bundling for the vitrine dev server, built on Rolldown.
//!
//! Every request builds a fresh bundle graph. Nothing is cached between
//! requests, so concurrent bundles never share state.
//!
//! ## Browser bundles
//!
//! ```no_run
//! use vitrine_bundler::ModuleBundler;
//! use vitrine_core::{RequestDescriptor, RootSet, TransformOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roots = RootSet::new(["./my-button"]);
//! let file = roots.resolve("/widget.js").expect("widget.js exists");
//! let request = RequestDescriptor::from_uri("/widget.js?expose=my-widget&external=react");
//!
//! let bundler = ModuleBundler::new("./my-button");
//! let bundle = bundler.bundle(&file, &TransformOptions::from_request(&request)).await?;
//! println!("{} bytes", bundle.code().len());
//! # Ok(()) }
//! ```
//!
//! ## Streaming
//!
//! [`ModuleBundler::stream`] writes the bundle into any
//! [`vitrine_core::ChunkSink`] and reports failures through an
//! [`vitrine_core::ErrorSurface`], ending the stream with a failure payload.
//! Rolldown produces output only after the whole build, so the body starts
//! once bundling is done and is then written in bounded pieces.
//!
//! ## Server-side render bundles
//!
//! [`ModuleBundler::bundle_for_render`] produces a CommonJS bundle for Node
//! with every bare import left external.

pub mod builder;
pub mod diagnostics;
pub mod plugins;
pub mod stream;

pub use builder::{BuildTarget, BundledModule, ModuleBundler, REGISTRY_GLOBAL};
pub use stream::{StreamOutcome, failure_payload};

// Re-export core Rolldown types for library users
pub use rolldown::{BundleOutput, BundlerOptions, InputItem, OutputFormat, Platform, SourceMapType};
pub use rolldown_common::{ModuleType, Output, OutputChunk};

/// Error types for vitrine-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from Rolldown bundler.
    #[error("{}", format_bundler_error(.0))]
    Bundler(Vec<diagnostics::ExtractedDiagnostic>),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bundle produced no entry chunk.
    #[error("Bundle for {0} produced no output")]
    EmptyOutput(String),
}

/// Result type alias for vitrine-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a failed Rolldown build.
    ///
    /// File paths in the diagnostics are shown relative to `cwd`.
    pub fn from_rolldown_batch(
        batch: &rolldown_error::BatchedBuildDiagnostic,
        cwd: &std::path::Path,
    ) -> Self {
        Error::Bundler(diagnostics::extract_from_batch(batch, cwd))
    }
}

impl From<Error> for vitrine_core::CompilationFailure {
    fn from(err: Error) -> Self {
        let failure = vitrine_core::CompilationFailure::compilation(err.to_string());
        match &err {
            Error::Bundler(diagnostics) => {
                let stack = diagnostics
                    .iter()
                    .flat_map(|d| d.location().into_iter().chain(d.frame.clone()))
                    .collect::<Vec<_>>()
                    .join("\n");
                if stack.is_empty() {
                    failure
                } else {
                    failure.with_stack(stack)
                }
            }
            _ => failure,
        }
    }
}

/// Format bundler error diagnostics for display.
fn format_bundler_error(diagnostics: &[diagnostics::ExtractedDiagnostic]) -> String {
    if diagnostics.is_empty() {
        return "Unknown bundler error".to_string();
    }

    if diagnostics.len() == 1 {
        let diag = &diagnostics[0];
        format!("{}: {}", diag.kind, diag.message)
    } else {
        format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind, d.message))
                .collect::<Vec<_>>()
                .join("; ")
        )
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundler(_) => "BUNDLER_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::EmptyOutput(_) => "EMPTY_OUTPUT",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Bundler(diagnostics) if diagnostics.len() == 1 => diagnostics[0]
                .help
                .as_ref()
                .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>),
            Error::Bundler(_) => Some(Box::new(
                "Multiple bundler errors occurred. See details below.".to_string(),
            )),
            _ => None,
        }
    }
}
