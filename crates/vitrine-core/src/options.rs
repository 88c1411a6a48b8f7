//! Module bundling flags derived from the query string.

use crate::request::{QueryValue, RequestDescriptor};
use serde::Serialize;
use std::collections::BTreeSet;

/// Enables inline source maps.
pub const DEBUG_KEY: &str = "debug";
/// Registers the entry module under a logical name.
pub const EXPOSE_KEY: &str = "expose";
/// Leaves a module out of the bundle. Repeatable.
pub const EXTERNAL_KEY: &str = "external";
/// Enables syntax transpilation of project files.
pub const TRANSPILE_KEY: &str = "babelify";
/// Bundles a file even when it lives in a vendored directory.
pub const FORCE_BUNDLE_KEY: &str = "browserify";

/// Options for one module bundle.
///
/// Every flag is off and every collection empty unless the matching query
/// key is present. Flags only look at presence, not at the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformOptions {
    pub source_maps: bool,
    pub expose: Option<String>,
    pub externals: BTreeSet<String>,
    pub transpile: bool,
    pub force_bundle: bool,
}

impl TransformOptions {
    /// Derive options from a request's query.
    pub fn from_request(request: &RequestDescriptor) -> Self {
        let externals = request
            .get(EXTERNAL_KEY)
            .into_iter()
            .flat_map(QueryValue::values)
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        let expose = request
            .get(EXPOSE_KEY)
            .and_then(QueryValue::last)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Self {
            source_maps: request.has(DEBUG_KEY),
            expose,
            externals,
            transpile: request.has(TRANSPILE_KEY),
            force_bundle: request.has(FORCE_BUNDLE_KEY),
        }
    }

    pub fn is_external(&self, specifier: &str) -> bool {
        self.externals.contains(specifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(uri: &str) -> TransformOptions {
        TransformOptions::from_request(&RequestDescriptor::from_uri(uri))
    }

    #[test]
    fn test_defaults_without_query() {
        assert_eq!(options("/widget.js"), TransformOptions::default());
    }

    #[test]
    fn test_single_external_is_a_set() {
        let opts = options("/widget.js?external=react");
        assert_eq!(opts.externals.len(), 1);
        assert!(opts.is_external("react"));
    }

    #[test]
    fn test_two_externals_make_two_element_set() {
        let opts = options("/widget.js?external=react&external=react-dom");
        assert_eq!(
            opts.externals.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["react", "react-dom"]
        );
    }

    #[test]
    fn test_duplicate_externals_collapse() {
        let opts = options("/widget.js?external=react&external=react");
        assert_eq!(opts.externals.len(), 1);
    }

    #[test]
    fn test_flags_are_presence_based() {
        let opts = options("/widget.js?debug&babelify=&browserify=1");
        assert!(opts.source_maps);
        assert!(opts.transpile);
        assert!(opts.force_bundle);
    }

    #[test]
    fn test_expose_takes_last_value() {
        let opts = options("/widget.js?expose=first&expose=my-widget");
        assert_eq!(opts.expose.as_deref(), Some("my-widget"));
    }

    #[test]
    fn test_empty_expose_is_ignored() {
        assert_eq!(options("/widget.js?expose=").expose, None);
    }
}
