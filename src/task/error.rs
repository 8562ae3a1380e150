//! Error types for the task scheduler

use crate::task::task::TaskId;

/// Result type alias for scheduler operations
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Rejected scheduler requests
///
/// Every variant leaves the scheduler untouched: no task is registered and
/// no event is published.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task {running} is already running on plugin {model_index}")]
    AlreadyRunning { running: TaskId, model_index: usize },

    #[error("Invalid model index {index} ({count} plugins loaded)")]
    InvalidModelIndex { index: usize, count: usize },
}

impl crate::core::error_handling::ContextualError for TaskError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            TaskError::AlreadyRunning { .. } => Some("Another task is still running"),
            TaskError::InvalidModelIndex { .. } => Some("Selected plugin index is not loaded"),
        }
    }
}
