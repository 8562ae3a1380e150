//! Plugin Error Handling
//!
//! Error types for plugin loading, lifecycle calls and descriptor parsing.

use std::path::PathBuf;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    /// Plugin index outside the loaded set
    #[error("No plugin at index {index} ({count} loaded)")]
    PluginNotFound { index: usize, count: usize },

    /// Input image had no pixels
    #[error("Plugin '{plugin_name}' received an empty image in '{operation}'")]
    EmptyInput {
        plugin_name: String,
        operation: String,
    },

    /// Plugin path could not be turned into an instance
    #[error("Failed to load plugin '{}': {}", .path.display(), .cause)]
    LoadError { path: PathBuf, cause: String },

    /// Plugin descriptor could not be read
    #[error("Failed to read plugin descriptor '{}': {}", .path.display(), .cause)]
    DescriptorError { path: PathBuf, cause: String },

    /// Plugin call failed
    #[error("Plugin '{plugin_name}' failed during '{operation}': {cause}")]
    ExecutionError {
        plugin_name: String,
        operation: String,
        cause: String,
    },
}

impl crate::core::error_handling::ContextualError for PluginError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            PluginError::PluginNotFound { .. }
                | PluginError::LoadError { .. }
                | PluginError::DescriptorError { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PluginError::PluginNotFound { .. } => Some("Selected plugin index is not loaded"),
            PluginError::LoadError { .. } => Some("A configured plugin could not be loaded"),
            PluginError::DescriptorError { .. } => Some("The plugin descriptor file is unreadable"),
            _ => None,
        }
    }
}
