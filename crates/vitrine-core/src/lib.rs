//! # vitrine-core
//!
//! Request routing primitives shared by the vitrine dev server.
//!
//! A request travels through this crate in three steps:
//!
//! 1. [`RequestDescriptor`] captures the path and the decoded query string.
//! 2. [`Classifier::classify`] picks the handler (document, style or module),
//!    resolves the backing file across the [`RootSet`] and derives
//!    [`TransformOptions`].
//! 3. The handler produces a [`CompiledArtifact`]. Failures go through the
//!    [`ErrorSurface`] exactly once.
//!
//! ```no_run
//! use vitrine_core::{Classifier, RequestDescriptor, RootSet};
//!
//! let roots = RootSet::new(["/work/button", "/opt/vitrine/builtin"]);
//! let classifier = Classifier::new(roots, vec!["node_modules".to_string()]);
//!
//! let request = RequestDescriptor::from_uri("/widget.js?expose=my-widget&external=react");
//! if let Some(route) = classifier.classify(&request) {
//!     println!("{:?} -> {}", route.handler, route.file.path().display());
//! }
//! ```

pub mod artifact;
pub mod classify;
pub mod descriptor;
pub mod options;
pub mod request;
pub mod roots;
pub mod sink;
pub mod surface;

pub use artifact::{
    Artifact, CONTENT_TYPE_CSS, CONTENT_TYPE_HTML, CONTENT_TYPE_JS, CompilationFailure,
    CompiledArtifact, FailureKind,
};
pub use classify::{Classification, Classifier, HandlerKind, is_vendored, match_handler};
pub use descriptor::{DEFAULT_DESCRIPTOR_KEY, DESCRIPTOR_FILE, DevserverBlock, PackageDescriptor};
pub use options::TransformOptions;
pub use request::{QueryValue, RequestDescriptor, decode_path};
pub use roots::{ResolvedFile, RootSet, resolve};
pub use sink::{ChunkSink, SinkClosed};
pub use surface::{ErrorSurface, FailureNotice, Notifier};

use std::path::PathBuf;

/// Error types for vitrine-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required descriptor field is absent.
    #[error("Missing required field '{field}' in {}", .path.display())]
    MissingField { field: String, path: PathBuf },

    /// The package descriptor is not valid JSON or has the wrong shape.
    #[error("Invalid package descriptor {}: {source}", .path.display())]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading a file failed.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for vitrine-core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for CompilationFailure {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::MissingField { .. } | Error::InvalidDescriptor { .. } => {
                FailureKind::Configuration
            }
            Error::Io { .. } => FailureKind::Compilation,
        };
        CompilationFailure::new(kind, err.to_string())
    }
}
