//! Stylesheet compilation with lightningcss
//!
//! Every `.css` request is compiled from source through an ordered transform
//! chain: nesting expansion, then downleveling against browser targets. The
//! result is plain CSS with an optional inline source map.
//!
//! ```text
//! .css file → parse → [nesting] → [downlevel] → print (+ source map) → CSS
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vitrine_style::{StyleCompiler, StyleOptions};
//!
//! let compiler = StyleCompiler::new(StyleOptions::default().with_minify(false));
//! let compiled = compiler.compile_source("card.css", ".card { & .title { color: red } }")?;
//! println!("{}", compiled.code);
//! # Ok::<(), vitrine_style::StyleError>(())
//! ```

use base64::{Engine as _, engine::general_purpose::STANDARD};
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
    targets::{Features, Targets},
};
use parcel_sourcemap::SourceMap;
use std::path::{Path, PathBuf};
use vitrine_core::{Artifact, CompilationFailure, CompiledArtifact, ResolvedFile};

mod config;
pub use config::{BrowserTargets, StyleOptions, StyleTransform};

/// Errors produced while compiling a stylesheet.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSS parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("CSS transform error in {file}: {message}")]
    Transform { file: String, message: String },

    #[error("CSS print error in {file}: {message}")]
    Print { file: String, message: String },

    #[error("Source map error in {file}: {message}")]
    SourceMap { file: String, message: String },
}

impl From<StyleError> for CompilationFailure {
    fn from(err: StyleError) -> Self {
        CompilationFailure::compilation(err.to_string())
    }
}

/// Output of one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    /// CSS, with the source map comment appended when enabled.
    pub code: String,
    /// Source map JSON, when enabled.
    pub map: Option<String>,
}

/// Compiles stylesheets with a fixed option set.
#[derive(Debug, Clone, Default)]
pub struct StyleCompiler {
    options: StyleOptions,
}

impl StyleCompiler {
    pub fn new(options: StyleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &StyleOptions {
        &self.options
    }

    /// Lightningcss targets for the configured chain.
    fn targets(&self) -> Targets {
        let mut targets = Targets::default();
        for step in &self.options.chain {
            match step {
                StyleTransform::Nesting => targets.include |= Features::Nesting,
                StyleTransform::Downlevel => {
                    targets.browsers = Some(self.options.targets.to_browsers());
                }
            }
        }
        targets
    }

    /// Compile stylesheet text. `filename` names the source in messages and
    /// in the source map.
    pub fn compile_source(&self, filename: &str, source: &str) -> Result<CompiledStyle, StyleError> {
        let mut stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: filename.to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| StyleError::Parse {
            file: filename.to_string(),
            message: e.to_string(),
        })?;

        let targets = self.targets();

        stylesheet
            .minify(MinifyOptions {
                targets,
                ..Default::default()
            })
            .map_err(|e| StyleError::Transform {
                file: filename.to_string(),
                message: e.to_string(),
            })?;

        let mut source_map = if self.options.source_map {
            let mut map = SourceMap::new("/");
            map.add_source(filename);
            map.set_source_content(0, source)
                .map_err(|e| StyleError::SourceMap {
                    file: filename.to_string(),
                    message: format!("{e:?}"),
                })?;
            Some(map)
        } else {
            None
        };

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.options.minify,
                source_map: source_map.as_mut(),
                targets,
                ..Default::default()
            })
            .map_err(|e| StyleError::Print {
                file: filename.to_string(),
                message: e.to_string(),
            })?;

        let mut code = result.code;
        let map = match source_map.as_mut() {
            Some(map) => {
                let json = map.to_json(None).map_err(|e| StyleError::SourceMap {
                    file: filename.to_string(),
                    message: format!("{e:?}"),
                })?;
                code.push_str(&format!(
                    "\n/*# sourceMappingURL=data:application/json;base64,{} */\n",
                    STANDARD.encode(json.as_bytes())
                ));
                Some(json)
            }
            None => None,
        };

        Ok(CompiledStyle { code, map })
    }

    /// Read and compile a file from disk.
    pub fn compile_path(&self, path: &Path, filename: &str) -> Result<CompiledStyle, StyleError> {
        let source = std::fs::read_to_string(path).map_err(|source| StyleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile_source(filename, &source)
    }

    /// Compile a resolved stylesheet into a response artifact.
    pub fn compile_style(&self, file: &ResolvedFile) -> CompiledArtifact {
        let filename = file.relative().to_string_lossy().replace('\\', "/");
        let compiled = self.compile_path(file.path(), &filename)?;

        tracing::debug!(
            file = %file.path().display(),
            bytes = compiled.code.len(),
            "compiled stylesheet"
        );

        Ok(Artifact::css(compiled.code))
    }

    /// [`StyleCompiler::compile_style`] on the blocking thread pool.
    pub async fn compile_style_blocking(&self, file: ResolvedFile) -> CompiledArtifact {
        let compiler = self.clone();
        tokio::task::spawn_blocking(move || compiler.compile_style(&file))
            .await
            .unwrap_or_else(|e| {
                Err(CompilationFailure::compilation(format!(
                    "Style compiler task failed: {e}"
                )))
            })
    }
}

/// Compile a resolved stylesheet with the given options.
pub fn compile_style(file: &ResolvedFile, options: &StyleOptions) -> CompiledArtifact {
    StyleCompiler::new(options.clone()).compile_style(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use vitrine_core::{FailureKind, RootSet};

    fn plain() -> StyleCompiler {
        StyleCompiler::new(StyleOptions::new().with_minify(false).with_source_map(false))
    }

    #[test]
    fn test_nesting_is_expanded() {
        let css = ".card { color: red; & .title { color: blue; } }";
        let out = plain().compile_source("card.css", css).unwrap();

        assert!(out.code.contains(".card .title"));
        assert!(!out.code.contains('&'));
    }

    #[test]
    fn test_nesting_only_chain_still_flattens() {
        let compiler = StyleCompiler::new(
            StyleOptions::new()
                .with_minify(false)
                .with_source_map(false)
                .with_chain(vec![StyleTransform::Nesting]),
        );
        let out = compiler
            .compile_source("card.css", ".a { .b & { color: red } }")
            .unwrap();
        assert!(out.code.contains(".b .a"));
    }

    #[test]
    fn test_minify_shrinks_output() {
        let css = "body {\n  color: red;\n  background: blue;\n}\n";
        let compiler = StyleCompiler::new(StyleOptions::new().with_source_map(false));
        let out = compiler.compile_source("body.css", css).unwrap();

        assert!(out.code.len() < css.len());
        assert!(out.code.contains("color"));
        assert!(out.code.contains("background"));
    }

    #[test]
    fn test_source_map_is_inlined() {
        let compiler = StyleCompiler::new(StyleOptions::new().with_minify(false));
        let out = compiler.compile_source("theme.css", "a { color: red }").unwrap();

        assert!(out.code.contains("sourceMappingURL=data:application/json;base64,"));
        let map = out.map.unwrap();
        assert!(map.contains("theme.css"));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let compiler = StyleCompiler::default();
        let css = ".x { & > .y { display: flex; } }";
        let first = compiler.compile_source("x.css", css).unwrap();
        let second = compiler.compile_source("x.css", css).unwrap();
        assert_eq!(first.code, second.code);
    }

    #[test]
    fn test_syntax_error_becomes_failure() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.css"), "%%% { color: red; }").unwrap();
        fs::write(temp.path().join("ok.css"), "a { color: red }").unwrap();
        let roots = RootSet::new([temp.path()]);
        let compiler = StyleCompiler::default();

        let failure = compiler
            .compile_style(&roots.resolve("/broken.css").unwrap())
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Compilation);
        assert!(!failure.message.is_empty());
        assert!(failure.message.contains("broken.css"));

        let ok = compiler.compile_style(&roots.resolve("/ok.css").unwrap());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_artifact_content_type() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("index.css"), "a { color: red }").unwrap();
        let roots = RootSet::new([temp.path()]);

        let artifact = compile_style(&roots.resolve("/index.css").unwrap(), &StyleOptions::default())
            .unwrap();
        assert_eq!(artifact.content_type, "text/css");
    }

    #[tokio::test]
    async fn test_blocking_compile() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.css"), ".a { & b { color: red } }").unwrap();
        let roots = RootSet::new([temp.path()]);

        let artifact = StyleCompiler::default()
            .compile_style_blocking(roots.resolve("/a.css").unwrap())
            .await
            .unwrap();
        assert!(String::from_utf8(artifact.bytes).unwrap().contains(".a b"));
    }
}
