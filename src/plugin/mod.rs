//! Plugin System Module
//!
//! Lifecycle contract for image-processing plugins, the registry that owns
//! loaded instances, compiled-in plugins and the descriptor loader.

// Internal modules - all access should go through api module
pub(crate) mod builtin;
pub(crate) mod error;
pub(crate) mod loader;
pub(crate) mod registry;
pub(crate) mod traits;
pub(crate) mod types;

// Public API module - the only public interface for the plugin system
pub mod api;

#[cfg(test)]
pub(crate) mod tests;
