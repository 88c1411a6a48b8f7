//! External module handling.
//!
//! In the browser an external specifier is served from the page-wide module
//! registry that earlier bundles filled through `?expose=`. For server-side
//! rendering every bare import is left for Node's `require`.

use crate::builder::REGISTRY_GLOBAL;
use crate::plugins::entry::js_string;
use crate::plugins::{PluginPhase, VitrinePlugin};
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Module id prefix of registry shims.
pub const EXTERNAL_PREFIX: &str = "\0vitrine:external:";

/// Resolves the listed specifiers to shims that read the module registry.
#[derive(Debug, Clone)]
pub struct RegistryExternalPlugin {
    externals: BTreeSet<String>,
}

impl RegistryExternalPlugin {
    pub fn new(externals: BTreeSet<String>) -> Self {
        Self { externals }
    }

    /// CommonJS shim for one external name.
    pub fn shim(name: &str) -> String {
        let name = js_string(name);
        format!(
            "var registry = (typeof globalThis !== \"undefined\" ? globalThis : window).{REGISTRY_GLOBAL};\n\
             if (!registry || !Object.prototype.hasOwnProperty.call(registry, {name})) {{\n\
             \x20 throw new Error(\"Module \" + {name} + \" is external but no script on this page exposes it\");\n\
             }}\n\
             module.exports = registry[{name}];\n"
        )
    }
}

impl Plugin for RegistryExternalPlugin {
    fn name(&self) -> Cow<'static, str> {
        "vitrine:registry-externals".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let resolved = self
            .externals
            .contains(args.specifier)
            .then(|| format!("{EXTERNAL_PREFIX}{}", args.specifier));

        async move {
            Ok(resolved.map(|id| HookResolveIdOutput {
                id: id.into(),
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
        let shim = args.id.strip_prefix(EXTERNAL_PREFIX).map(Self::shim);

        async move {
            Ok(shim.map(|code| HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

impl VitrinePlugin for RegistryExternalPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Resolve
    }
}

/// Marks every bare import as external.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeExternalPlugin;

impl Plugin for NodeExternalPlugin {
    fn name(&self) -> Cow<'static, str> {
        "vitrine:node-externals".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let resolved = (args.importer.is_some() && is_bare_specifier(args.specifier))
            .then(|| args.specifier.to_string());

        async move {
            Ok(resolved.map(|specifier| HookResolveIdOutput {
                id: specifier.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }
}

impl VitrinePlugin for NodeExternalPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Resolve
    }
}

/// A package import such as `react` or `@scope/pkg/sub`, as opposed to a
/// relative, absolute or virtual one.
pub fn is_bare_specifier(specifier: &str) -> bool {
    let bytes = specifier.as_bytes();
    match bytes.first() {
        None | Some(b'.' | b'/' | b'\\' | b'\0') => false,
        _ => !(bytes.len() > 2 && bytes[1] == b':' && matches!(bytes[2], b'\\' | b'/')),
    }
}
