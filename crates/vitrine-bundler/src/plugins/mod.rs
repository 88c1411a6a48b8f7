//! Rolldown plugins used by the module handler.
//!
//! - [`EntryPlugin`]: virtual entry that registers the bundle under an exposed name
//! - [`RegistryExternalPlugin`]: resolves external specifiers to the page registry
//! - [`NodeExternalPlugin`]: leaves bare imports to Node's `require`
//! - [`SyntaxPlugin`]: JSX and newer syntax for project sources

mod entry;
mod external;
mod registry;
mod syntax;

pub use entry::{ENTRY_ID, EntryPlugin};
pub(crate) use entry::js_string;
pub use external::{EXTERNAL_PREFIX, NodeExternalPlugin, RegistryExternalPlugin, is_bare_specifier};
pub use registry::{PluginPhase, PluginRegistry, VitrinePlugin};
pub use syntax::{CLASSIC_RUNTIME_PRAGMA, SyntaxPlugin};
