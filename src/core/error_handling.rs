//! Error reporting helpers shared by all subsystems
//!
//! Subsystem errors stay typed (`PluginError`, `TaskError`, ...). At the
//! top level they are reported through `log_error_with_context`, which picks
//! between a user-facing message and a generic context line.

/// Errors that know whether the user can act on them
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for errors the user can fix: a bad index, a missing file,
    /// an invalid setting
    fn is_user_actionable(&self) -> bool;

    /// Short actionable message for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Text of the primary `FATAL:` line for `error`
pub fn fatal_message<'a, E: ContextualError>(error: &'a E, operation_context: &'a str) -> &'a str {
    if error.is_user_actionable() {
        error.user_message().unwrap_or(operation_context)
    } else {
        operation_context
    }
}

/// Log a fatal error with the detail level it deserves
///
/// The primary line carries the user message for actionable errors and
/// `operation_context` otherwise. The full error is always logged at debug.
///
/// ```rust,no_run
/// # use plugview::core::error_handling::log_error_with_context;
/// # use plugview::task::api::TaskError;
/// let err = TaskError::InvalidModelIndex { index: 4, count: 1 };
/// log_error_with_context(&err, "Starting task");
/// // Logs: "FATAL: Selected plugin index is not loaded"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    log::error!("FATAL: {}", fatal_message(error, operation_context));
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::api::NotificationError;
    use crate::plugin::api::PluginError;
    use crate::task::api::TaskError;

    #[test]
    fn test_actionable_error_uses_user_message() {
        let error = TaskError::InvalidModelIndex { index: 2, count: 1 };
        assert_eq!(
            fatal_message(&error, "Starting task"),
            "Selected plugin index is not loaded"
        );
    }

    #[test]
    fn test_system_error_uses_context() {
        let error = PluginError::ExecutionError {
            plugin_name: "HSV Plugin".to_string(),
            operation: "fetch".to_string(),
            cause: "out of memory".to_string(),
        };
        assert!(!error.is_user_actionable());
        assert_eq!(fatal_message(&error, "Rendering image"), "Rendering image");

        let error = NotificationError::UnknownSubscriber("viewer".to_string());
        assert_eq!(fatal_message(&error, "Unsubscribing"), "Unsubscribing");
    }

    #[test]
    fn test_log_error_does_not_panic() {
        let error = TaskError::InvalidModelIndex { index: 0, count: 0 };
        log_error_with_context(&error, "Starting task");
    }
}
