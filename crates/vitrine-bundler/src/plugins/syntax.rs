//! JSX and newer syntax for project sources.
//!
//! With transpiling on, project `.js`, `.jsx`, `.mjs` and `.es6` files load
//! as JSX using the classic runtime, so `React.createElement` resolves
//! through the same `react` import the file already has. Vendored files are
//! left to Rolldown's default loader. Whether a file is vendored is decided
//! on its path relative to the project directory, so a project that itself
//! lives inside an installed package still transpiles its own sources.

use crate::plugins::{PluginPhase, VitrinePlugin};
use anyhow::Context;
use rolldown_common::ModuleType;
use rolldown_plugin::{HookLoadArgs, HookLoadOutput, HookLoadReturn, HookUsage, Plugin, PluginContext};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Per-file pragma selecting the classic JSX runtime.
pub const CLASSIC_RUNTIME_PRAGMA: &str = "/** @jsxRuntime classic */ ";

#[derive(Debug, Clone)]
pub struct SyntaxPlugin {
    transpile: bool,
    vendor_dirs: Vec<String>,
    project_dir: Option<PathBuf>,
}

impl SyntaxPlugin {
    pub fn new(transpile: bool) -> Self {
        Self {
            transpile,
            vendor_dirs: vec!["node_modules".to_string()],
            project_dir: None,
        }
    }

    pub fn with_vendor_dirs(mut self, vendor_dirs: Vec<String>) -> Self {
        self.vendor_dirs = vendor_dirs;
        self
    }

    /// Absolute project directory that vendored paths are measured from.
    pub fn with_project_dir(mut self, project_dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(project_dir.into());
        self
    }

    /// Module type to load `id` as, or `None` to leave it to Rolldown.
    pub fn module_type_for(&self, id: &str) -> Option<ModuleType> {
        if id.starts_with('\0') {
            return None;
        }
        let path = Path::new(id);
        if self.is_vendored(path) {
            return None;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "jsx" | "mjs" | "es6") if self.transpile => Some(ModuleType::Jsx),
            Some("es6") => Some(ModuleType::Js),
            _ => None,
        }
    }

    fn is_vendored(&self, path: &Path) -> bool {
        let scoped = self
            .project_dir
            .as_deref()
            .and_then(|dir| path.strip_prefix(dir).ok())
            .unwrap_or(path);
        scoped.components().any(|component| match component {
            Component::Normal(name) => self.vendor_dirs.iter().any(|dir| name == dir.as_str()),
            _ => false,
        })
    }
}

impl Plugin for SyntaxPlugin {
    fn name(&self) -> Cow<'static, str> {
        "vitrine:syntax".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let module_type = self.module_type_for(&id);

        async move {
            let Some(module_type) = module_type else {
                return Ok(None);
            };

            let source = tokio::fs::read_to_string(&id)
                .await
                .with_context(|| format!("Failed to read {}", id))?;

            let code = if matches!(module_type, ModuleType::Jsx) {
                // Same line, so reported line numbers stay correct.
                format!("{CLASSIC_RUNTIME_PRAGMA}{source}")
            } else {
                source
            };

            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(module_type),
                ..Default::default()
            }))
        }
    }
}

impl VitrinePlugin for SyntaxPlugin {}
