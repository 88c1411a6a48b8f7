//! Bundle construction and execution.

use crate::plugins::{
    ENTRY_ID, EntryPlugin, NodeExternalPlugin, PluginRegistry, RegistryExternalPlugin, SyntaxPlugin,
};
use crate::{Error, Result};
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform,
    ResolveOptions, SourceMapType,
};
use rolldown_common::Output;
use path_clean::PathClean;
use rolldown_plugin::__inner::SharedPluginable;
use std::path::{Path, PathBuf};
use vitrine_core::{ResolvedFile, TransformOptions};

/// Global object property holding exposed modules on the page.
pub const REGISTRY_GLOBAL: &str = "__vitrine_modules__";

/// Where a bundle is going to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    /// A `<script>` in the preview page.
    Browser,
    /// The render subprocess: CommonJS, bare imports left to Node.
    Render,
}

impl BuildTarget {
    fn platform(self) -> Platform {
        match self {
            BuildTarget::Browser => Platform::Browser,
            BuildTarget::Render => Platform::Node,
        }
    }

    fn format(self) -> OutputFormat {
        match self {
            BuildTarget::Browser => OutputFormat::Iife,
            BuildTarget::Render => OutputFormat::Cjs,
        }
    }

    fn conditions(self) -> &'static [&'static str] {
        match self {
            BuildTarget::Browser => &["browser", "import", "module", "require", "default"],
            BuildTarget::Render => &["node", "import", "module", "require", "default"],
        }
    }
}

/// A finished bundle.
#[derive(Debug, Clone, Default)]
pub struct BundledModule {
    /// Code of every emitted chunk, in output order.
    pub chunks: Vec<String>,
    /// Output file names, parallel to `chunks`.
    pub filenames: Vec<String>,
    /// Number of warnings Rolldown reported.
    pub warnings: usize,
}

impl BundledModule {
    /// All chunks joined.
    pub fn code(&self) -> String {
        self.chunks.join("\n")
    }

    pub fn len(&self) -> usize {
        self.chunks.iter().map(String::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds bundles for one project directory.
///
/// Every call constructs a new Rolldown bundler, so calls may run
/// concurrently.
#[derive(Debug, Clone)]
pub struct ModuleBundler {
    cwd: PathBuf,
    vendor_dirs: Vec<String>,
}

impl ModuleBundler {
    /// `cwd` is the project directory; packages resolve from its
    /// `node_modules` and those of its ancestors.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            vendor_dirs: vec!["node_modules".to_string()],
        }
    }

    pub fn with_vendor_dirs(mut self, vendor_dirs: Vec<String>) -> Self {
        self.vendor_dirs = vendor_dirs;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Bundle a file for the browser.
    pub async fn bundle(&self, file: &ResolvedFile, options: &TransformOptions) -> Result<BundledModule> {
        let target = path_string(file.path())?;

        let mut registry = PluginRegistry::new();
        registry.add(EntryPlugin::new(target, options.expose.clone()));
        if !options.externals.is_empty() {
            registry.add(RegistryExternalPlugin::new(options.externals.clone()));
        }
        registry.add(self.syntax_plugin(options.transpile)?);

        let mut bundler_options = self.configure_options(BuildTarget::Browser, ENTRY_ID);
        if options.source_maps {
            bundler_options.sourcemap = Some(SourceMapType::Inline);
        }

        tracing::debug!(
            file = %file.path().display(),
            expose = options.expose.as_deref().unwrap_or(""),
            externals = ?options.externals,
            transpile = options.transpile,
            "bundling module"
        );

        self.execute(bundler_options, registry.into_rolldown_plugins())
            .await
    }

    /// Bundle `entry` as CommonJS for the render subprocess.
    pub async fn bundle_for_render(&self, entry: &Path) -> Result<String> {
        let mut registry = PluginRegistry::new();
        registry.add(NodeExternalPlugin);
        registry.add(self.syntax_plugin(true)?);

        let bundler_options = self.configure_options(BuildTarget::Render, &path_string(entry)?);
        let bundle = self
            .execute(bundler_options, registry.into_rolldown_plugins())
            .await?;

        bundle
            .chunks
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyOutput(entry.display().to_string()))
    }

    fn syntax_plugin(&self, transpile: bool) -> Result<SyntaxPlugin> {
        Ok(SyntaxPlugin::new(transpile)
            .with_vendor_dirs(self.vendor_dirs.clone())
            .with_project_dir(path_string(&self.cwd)?))
    }

    fn configure_options(&self, target: BuildTarget, import: &str) -> BundlerOptions {
        BundlerOptions {
            input: Some(vec![InputItem {
                name: Some("bundle".to_string()),
                import: import.to_string(),
            }]),
            cwd: Some(self.cwd.clone()),
            format: Some(target.format()),
            platform: Some(target.platform()),
            resolve: Some(configure_resolution(&self.cwd, target)),
            ..Default::default()
        }
    }

    async fn execute(
        &self,
        options: BundlerOptions,
        plugins: Vec<SharedPluginable>,
    ) -> Result<BundledModule> {
        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(options)
            .with_plugins(plugins)
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e, &self.cwd))?;

        let output = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e, &self.cwd))?;

        let mut bundle = BundledModule {
            warnings: output.warnings.len(),
            ..Default::default()
        };
        for asset in &output.assets {
            if let Output::Chunk(chunk) = asset {
                bundle.chunks.push(chunk.code.clone());
                bundle.filenames.push(chunk.filename.to_string());
            }
        }

        if bundle.warnings > 0 {
            tracing::debug!(warnings = bundle.warnings, "bundle finished with warnings");
        }

        Ok(bundle)
    }
}

/// Module resolution: `node_modules` of `cwd` and every ancestor.
fn configure_resolution(cwd: &Path, target: BuildTarget) -> ResolveOptions {
    let mut modules = Vec::new();
    let mut current = Some(cwd);
    while let Some(dir) = current {
        modules.push(dir.join("node_modules").to_string_lossy().to_string());
        current = dir.parent();
    }
    modules.push("node_modules".to_string());

    let main_fields = match target {
        BuildTarget::Browser => vec!["browser".to_string(), "module".to_string(), "main".to_string()],
        BuildTarget::Render => vec!["module".to_string(), "main".to_string()],
    };

    ResolveOptions {
        main_fields: Some(main_fields),
        condition_names: Some(target.conditions().iter().map(|c| c.to_string()).collect()),
        extensions: Some(vec![
            ".js".to_string(),
            ".jsx".to_string(),
            ".es6".to_string(),
            ".mjs".to_string(),
            ".json".to_string(),
        ]),
        modules: Some(modules),
        symlinks: Some(true),
        ..Default::default()
    }
}

fn path_string(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(absolute.clean().to_string_lossy().to_string())
}
