//! The document handler: the preview page.
//!
//! Composes the page from the package descriptor, the highlighted example
//! source, a server-side render of the example and the readme, then
//! substitutes them into `index.html`. Any failing step fails the whole
//! page.

mod highlight;
mod render;
mod template;

pub use highlight::{escape_html, highlight_js};
pub use render::RenderSandbox;
pub use template::{DocumentContext, TemplateError, normalize_placeholders, render_template};

use std::path::PathBuf;
use vitrine_bundler::ModuleBundler;
use vitrine_core::{
    Artifact, CompilationFailure, CompiledArtifact, PackageDescriptor, ResolvedFile, RootSet,
};

/// Name of the page template looked up across the roots.
pub const TEMPLATE_FILE: &str = "index.html";

/// Renders the preview page for one project.
#[derive(Debug, Clone)]
pub struct DocumentHandler {
    roots: RootSet,
    descriptor_key: String,
    builtin_root: Option<PathBuf>,
    bundler: ModuleBundler,
    sandbox: RenderSandbox,
}

impl DocumentHandler {
    pub fn new(
        roots: RootSet,
        descriptor_key: impl Into<String>,
        bundler: ModuleBundler,
        sandbox: RenderSandbox,
    ) -> Self {
        Self {
            roots,
            descriptor_key: descriptor_key.into(),
            builtin_root: None,
            bundler,
            sandbox,
        }
    }

    /// A readme resolved from this root is the tool's own and is not shown.
    pub fn with_builtin_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.builtin_root = Some(root.into());
        self
    }

    /// Render the page. `descriptor` is the resolved `package.json`.
    pub async fn render_document(&self, descriptor: &ResolvedFile) -> CompiledArtifact {
        let package = PackageDescriptor::load(descriptor.path(), &self.descriptor_key)?;

        let example = self.roots.resolve(package.example()).ok_or_else(|| {
            CompilationFailure::configuration(format!(
                "Example file '{}' declared in {} does not exist",
                package.example(),
                descriptor.path().display()
            ))
        })?;
        let source = read_text(&example).await?;
        let highlighted = highlight_js(&source).map_err(|e| {
            CompilationFailure::compilation(format!("Highlighting failed: {e}"))
        })?;

        let demo = self.render_example(&example).await?;
        let readme = self.load_readme(&package).await?;

        let template_file = self.roots.resolve(TEMPLATE_FILE).ok_or_else(|| {
            CompilationFailure::configuration(format!("No {TEMPLATE_FILE} template found"))
        })?;
        let template = read_text(&template_file).await?;

        let context = DocumentContext {
            fields: package.fields().clone(),
            example: highlighted,
            demo,
            readme,
            entry: package.example().trim_start_matches("./").to_string(),
        };

        let html = render_template(&template, context).map_err(|e| {
            CompilationFailure::compilation(format!(
                "Template {} failed to render: {e}",
                template_file.path().display()
            ))
        })?;

        tracing::debug!(
            example = %example.path().display(),
            bytes = html.len(),
            "rendered document"
        );

        Ok(Artifact::html(html))
    }

    async fn render_example(&self, example: &ResolvedFile) -> Result<String, CompilationFailure> {
        let bundle = self.bundler.bundle_for_render(example.path()).await?;
        let project_dir = self.roots.primary().unwrap_or_else(|| example.root());
        self.sandbox
            .render(bundle, example.path(), project_dir)
            .await
    }

    async fn load_readme(
        &self,
        package: &PackageDescriptor,
    ) -> Result<Option<String>, CompilationFailure> {
        let Some(readme) = self.roots.resolve(package.readme()) else {
            return Ok(None);
        };
        if self.builtin_root.as_deref() == Some(readme.root()) || !readme.path().is_file() {
            return Ok(None);
        }
        let text = read_text(&readme).await?;
        Ok(Some(markdown::to_html(&text)))
    }
}

async fn read_text(file: &ResolvedFile) -> Result<String, CompilationFailure> {
    tokio::fs::read_to_string(file.path()).await.map_err(|e| {
        CompilationFailure::compilation(format!("Failed to read {}: {e}", file.path().display()))
    })
}
