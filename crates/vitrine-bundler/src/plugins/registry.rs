//! Plugin registry with execution phases.

use rolldown_plugin::{__inner::SharedPluginable, Plugin};
use std::sync::Arc;

/// Plugin execution phases
///
/// Plugins are executed in phase order (lower numbers first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Virtual modules that don't exist on disk. Always first.
    Virtual = 0,

    /// Module resolution overrides (externals).
    Resolve = 10,

    /// Content transformation of real files.
    Transform = 20,
}

/// A Rolldown plugin that knows its execution phase.
pub trait VitrinePlugin: Plugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Plugin registry that maintains plugins in phase order
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin; ordering happens once in `into_rolldown_plugins()`.
    pub fn add<P: VitrinePlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        let plugin: SharedPluginable = Arc::new(plugin);
        self.plugins.push((phase, plugin));
    }

    /// Convert to Rolldown plugins sorted by phase.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.plugins.sort_by_key(|(phase, _)| *phase);
        self.plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{NodeExternalPlugin, SyntaxPlugin};

    #[test]
    fn test_phase_order() {
        assert!(PluginPhase::Virtual < PluginPhase::Resolve);
        assert!(PluginPhase::Resolve < PluginPhase::Transform);
        assert_eq!(SyntaxPlugin::new(true).phase(), PluginPhase::Transform);
        assert_eq!(NodeExternalPlugin.phase(), PluginPhase::Resolve);
    }

    #[test]
    fn test_registry_collects_plugins() {
        let mut registry = PluginRegistry::new();
        assert!(registry.is_empty());
        registry.add(SyntaxPlugin::new(true));
        registry.add(NodeExternalPlugin);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.into_rolldown_plugins().len(), 2);
    }
}
