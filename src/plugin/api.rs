//! Public API for the plugin system
//!
//! External modules should import from here rather than directly from
//! internal modules.

// Plugin contract and value types
pub use crate::plugin::traits::ImagePlugin;
pub use crate::plugin::types::{
    is_empty_image, Artifact, ColorSpace, Image, PluginConfig, PluginStatus, PluginSummary,
};

// Error handling
pub use crate::plugin::error::{PluginError, PluginResult};

// Registry and handles
pub use crate::plugin::registry::{PluginGuard, PluginHandle, PluginRegistry};

// Compiled-in plugins
pub use crate::plugin::builtin::api::{builtin_plugins, find_builtin, BuiltinPluginEntry};
pub use crate::plugin::builtin::hsv::{rgb_to_hsv, HsvPlugin};

// Descriptor loading
pub use crate::plugin::loader::{
    load_plugins, plugin_id_from_path, resolve_plugin, PluginDescriptor,
};
