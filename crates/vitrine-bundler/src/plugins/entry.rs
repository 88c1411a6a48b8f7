//! Virtual entry module for browser bundles.
//!
//! Browser bundles never start from the requested file directly. The entry
//! installs a minimal `process` global for packages that read
//! `process.env.NODE_ENV`, requires the requested file and, when an exposed
//! name is set, stores its exports in the page-wide module registry so that
//! later bundles can import it as an external.

use crate::builder::REGISTRY_GLOBAL;
use crate::plugins::{PluginPhase, VitrinePlugin};
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use std::borrow::Cow;

/// Module id of the virtual entry.
pub const ENTRY_ID: &str = "\0vitrine:entry";

#[derive(Debug, Clone)]
pub struct EntryPlugin {
    target: String,
    expose: Option<String>,
}

impl EntryPlugin {
    /// `target` is the absolute path of the requested file.
    pub fn new(target: impl Into<String>, expose: Option<String>) -> Self {
        Self {
            target: target.into(),
            expose,
        }
    }

    /// Source of the virtual entry module.
    pub fn source(&self) -> String {
        let mut code = String::from(
            "var __vitrine_global = typeof globalThis !== \"undefined\" ? globalThis : typeof window !== \"undefined\" ? window : self;\n\
             if (!__vitrine_global.process) __vitrine_global.process = { env: { NODE_ENV: \"development\" } };\n",
        );
        code.push_str(&format!(
            "var __vitrine_exports = require({});\n",
            js_string(&self.target)
        ));
        if let Some(name) = &self.expose {
            code.push_str(&format!(
                "var __vitrine_registry = __vitrine_global.{REGISTRY_GLOBAL} = __vitrine_global.{REGISTRY_GLOBAL} || {{}};\n\
                 __vitrine_registry[{}] = __vitrine_exports;\n",
                js_string(name)
            ));
        }
        code
    }
}

/// A JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl Plugin for EntryPlugin {
    fn name(&self) -> Cow<'static, str> {
        "vitrine:entry".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let matched = args.specifier == ENTRY_ID;

        async move {
            if !matched {
                return Ok(None);
            }
            Ok(Some(HookResolveIdOutput {
                id: ENTRY_ID.into(),
                external: Some(ResolvedExternal::Bool(false)),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let source = (args.id == ENTRY_ID).then(|| self.source());

        async move {
            Ok(source.map(|code| HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

impl VitrinePlugin for EntryPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Virtual
    }
}
