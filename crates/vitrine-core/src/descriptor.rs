//! Package descriptor (`package.json`) with the dev server block.
//!
//! ```json
//! {
//!   "name": "my-button",
//!   "component-devserver": { "example": "example.js", "readme": "README.md" }
//! }
//! ```

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File name of the package descriptor.
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Default key of the dev server block inside the descriptor.
pub const DEFAULT_DESCRIPTOR_KEY: &str = "component-devserver";

/// The dev server block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DevserverBlock {
    /// Example entry file, relative to the project root. Required.
    pub example: String,
    /// Readme file name. Defaults to `README.md` when absent.
    #[serde(default)]
    pub readme: Option<String>,
}

/// A parsed package descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    path: PathBuf,
    fields: Map<String, Value>,
    devserver: DevserverBlock,
}

impl PackageDescriptor {
    /// Read and parse a descriptor from disk.
    pub fn load(path: &Path, key: &str) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &source, key)
    }

    /// Parse descriptor text. `path` is used for messages only.
    pub fn parse(path: &Path, source: &str, key: &str) -> Result<Self> {
        let invalid = |source| Error::InvalidDescriptor {
            path: path.to_path_buf(),
            source,
        };

        let fields: Map<String, Value> = serde_json::from_str(source).map_err(invalid)?;

        let missing = || Error::MissingField {
            field: format!("{key}.example"),
            path: path.to_path_buf(),
        };

        let block = fields.get(key).ok_or_else(missing)?;
        if block.get("example").is_none_or(Value::is_null) {
            return Err(missing());
        }
        let devserver: DevserverBlock =
            serde_json::from_value(block.clone()).map_err(invalid)?;
        if devserver.example.trim().is_empty() {
            return Err(missing());
        }

        Ok(Self {
            path: path.to_path_buf(),
            fields,
            devserver,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All top-level descriptor fields, as written.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn devserver(&self) -> &DevserverBlock {
        &self.devserver
    }

    pub fn example(&self) -> &str {
        &self.devserver.example
    }

    /// Readme file name, `README.md` unless configured.
    pub fn readme(&self) -> &str {
        self.devserver.readme.as_deref().unwrap_or("README.md")
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<PackageDescriptor> {
        PackageDescriptor::parse(Path::new("package.json"), source, DEFAULT_DESCRIPTOR_KEY)
    }

    #[test]
    fn test_parse_minimal() {
        let desc = parse(r#"{"component-devserver": {"example": "example.js"}}"#).unwrap();
        assert_eq!(desc.example(), "example.js");
        assert_eq!(desc.readme(), "README.md");
        assert_eq!(desc.name(), None);
    }

    #[test]
    fn test_parse_with_readme_and_fields() {
        let desc = parse(
            r#"{"name": "button", "version": "1.0.0",
                "component-devserver": {"example": "demo.js", "readme": "docs/USAGE.md"}}"#,
        )
        .unwrap();
        assert_eq!(desc.name(), Some("button"));
        assert_eq!(desc.readme(), "docs/USAGE.md");
        assert_eq!(desc.fields()["version"], "1.0.0");
    }

    #[test]
    fn test_missing_block_is_configuration_error() {
        let err = parse(r#"{"name": "button"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "component-devserver.example"));
    }

    #[test]
    fn test_missing_example_is_configuration_error() {
        let err = parse(r#"{"component-devserver": {"readme": "README.md"}}"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_empty_example_is_configuration_error() {
        let err = parse(r#"{"component-devserver": {"example": " "}}"#).unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_custom_key() {
        let desc = PackageDescriptor::parse(
            Path::new("package.json"),
            r#"{"vitrine": {"example": "ex.js"}}"#,
            "vitrine",
        )
        .unwrap();
        assert_eq!(desc.example(), "ex.js");
    }
}
