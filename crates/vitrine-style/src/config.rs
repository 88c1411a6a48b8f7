//! Stylesheet compilation configuration types

use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};

/// One step of the style transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTransform {
    /// Flatten nested rules into plain selectors.
    Nesting,
    /// Lower modern syntax and add vendor prefixes for the browser targets.
    Downlevel,
}

/// Minimum browser major versions used for downleveling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserTargets {
    pub chrome: Option<u32>,
    pub firefox: Option<u32>,
    pub safari: Option<u32>,
    pub edge: Option<u32>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        // Chrome 80+, Firefox 75+, Safari 13+, Edge 80+
        Self {
            chrome: Some(80),
            firefox: Some(75),
            safari: Some(13),
            edge: Some(80),
        }
    }
}

impl BrowserTargets {
    /// Convert to lightningcss browser versions (`major << 16`).
    pub fn to_browsers(self) -> Browsers {
        let version = |major: Option<u32>| major.map(|m| m << 16);
        Browsers {
            chrome: version(self.chrome),
            firefox: version(self.firefox),
            safari: version(self.safari),
            edge: version(self.edge),
            ..Default::default()
        }
    }
}

/// Configuration options for stylesheet compilation
///
/// Controls the transform chain, minification, browser targets and
/// whether an inline source map is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOptions {
    /// Enable CSS minification
    pub minify: bool,

    /// Append an inline source map comment
    pub source_map: bool,

    /// Browser targets for the downlevel step
    pub targets: BrowserTargets,

    /// Ordered transform chain
    pub chain: Vec<StyleTransform>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            minify: true,
            source_map: true,
            targets: BrowserTargets::default(),
            chain: vec![StyleTransform::Nesting, StyleTransform::Downlevel],
        }
    }
}

impl StyleOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable minification
    pub fn with_minify(mut self, enabled: bool) -> Self {
        self.minify = enabled;
        self
    }

    /// Enable source maps
    pub fn with_source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }

    /// Set browser targets
    pub fn with_targets(mut self, targets: BrowserTargets) -> Self {
        self.targets = targets;
        self
    }

    /// Replace the transform chain
    pub fn with_chain(mut self, chain: Vec<StyleTransform>) -> Self {
        self.chain = chain;
        self
    }
}
