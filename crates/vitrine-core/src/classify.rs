//! Request classification.
//!
//! Handlers are tried in a fixed order: document, style, module. The first
//! one whose pattern matches and whose backing file resolves claims the
//! request. Anything else is left to the static file fallback.

use crate::descriptor::DESCRIPTOR_FILE;
use crate::options::TransformOptions;
use crate::request::RequestDescriptor;
use crate::roots::{ResolvedFile, RootSet};
use std::path::{Component, Path};

/// The content handler a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandlerKind {
    Document,
    Style,
    Module,
}

impl std::fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::Document => write!(f, "document"),
            HandlerKind::Style => write!(f, "style"),
            HandlerKind::Module => write!(f, "module"),
        }
    }
}

/// A claimed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub handler: HandlerKind,
    /// Backing file. For documents this is the package descriptor.
    pub file: ResolvedFile,
    pub options: TransformOptions,
}

/// Pattern-only match of a request path, ignoring the filesystem.
pub fn match_handler(path: &str) -> Option<HandlerKind> {
    if path == "/" || path == "/index.html" {
        Some(HandlerKind::Document)
    } else if path.ends_with(".css") {
        Some(HandlerKind::Style)
    } else if path.ends_with(".js") || path.ends_with(".es6") {
        Some(HandlerKind::Module)
    } else {
        None
    }
}

/// Whether a resolved file sits under one of the vendored directories.
pub fn is_vendored(file: &ResolvedFile, vendor_dirs: &[String]) -> bool {
    file.relative().components().any(|component| match component {
        Component::Normal(name) => vendor_dirs.iter().any(|dir| name == dir.as_str()),
        _ => false,
    })
}

/// Routes requests to handlers using a fixed [`RootSet`].
#[derive(Debug, Clone)]
pub struct Classifier {
    roots: RootSet,
    vendor_dirs: Vec<String>,
}

impl Classifier {
    pub fn new(roots: RootSet, vendor_dirs: Vec<String>) -> Self {
        Self { roots, vendor_dirs }
    }

    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    pub fn vendor_dirs(&self) -> &[String] {
        &self.vendor_dirs
    }

    /// Classify a request. `None` means unhandled.
    pub fn classify(&self, request: &RequestDescriptor) -> Option<Classification> {
        let handler = match_handler(request.path())?;
        let options = TransformOptions::from_request(request);

        let file = match handler {
            HandlerKind::Document => self.roots.resolve(DESCRIPTOR_FILE)?,
            HandlerKind::Style => self.resolve_file(request.path())?,
            HandlerKind::Module => {
                let file = self.resolve_file(request.path())?;
                if is_vendored(&file, &self.vendor_dirs) && !options.force_bundle {
                    tracing::debug!(
                        path = %request.path(),
                        "vendored script without force flag, leaving to static serving"
                    );
                    return None;
                }
                file
            }
        };

        Some(Classification {
            handler,
            file,
            options,
        })
    }

    fn resolve_file(&self, request_path: &str) -> Option<ResolvedFile> {
        self.roots
            .resolve(request_path)
            .filter(|file| Path::is_file(file.path()))
    }
}
