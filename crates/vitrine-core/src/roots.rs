//! Ordered root directories and request path resolution.
//!
//! A [`RootSet`] is fixed when the server starts: the project directory comes
//! first, the tool's built-in directory last. Resolution walks the roots in
//! that order and returns the first existing file.

use std::path::{Component, Path, PathBuf};

/// Ordered sequence of root directories, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSet {
    roots: Vec<PathBuf>,
}

impl RootSet {
    /// Create a root set. Order is preserved; duplicates are kept.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Root directories in priority order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Highest priority root (the project directory).
    pub fn primary(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    /// Resolve a request path against every root in order.
    ///
    /// Any query or fragment is stripped first. Returns `None` when no root
    /// contains the file, or when the path tries to climb out of a root with
    /// `..`.
    pub fn resolve(&self, request_path: &str) -> Option<ResolvedFile> {
        let relative = relative_request_path(request_path)?;

        self.roots
            .iter()
            .enumerate()
            .find_map(|(index, root)| {
                let candidate = root.join(&relative);
                candidate.exists().then(|| ResolvedFile {
                    path: candidate,
                    root: root.clone(),
                    root_index: index,
                })
            })
    }
}

/// Free-function form of [`RootSet::resolve`].
pub fn resolve(request_path: &str, roots: &RootSet) -> Option<ResolvedFile> {
    roots.resolve(request_path)
}

/// A request path matched to a concrete file in one of the roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    path: PathBuf,
    root: PathBuf,
    root_index: usize,
}

impl ResolvedFile {
    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The root directory that matched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Position of the matching root in the [`RootSet`].
    pub fn root_index(&self) -> usize {
        self.root_index
    }

    /// Path of the file relative to its root.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.root).unwrap_or(&self.path)
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Strip the query/fragment and the leading slash, rejecting `..` segments.
fn relative_request_path(request_path: &str) -> Option<PathBuf> {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('/');

    let mut relative = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}
