//! Error types for the notification system

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("Unknown subscriber: {0}")]
    UnknownSubscriber(String),

    #[error(
        "Failed to publish {} event to {} subscribers: {:?}",
        .event_type,
        .failed_subscribers.len(),
        .failed_subscribers
    )]
    PublishFailed {
        event_type: String,
        failed_subscribers: Vec<String>,
    },
}

impl crate::core::error_handling::ContextualError for NotificationError {
    fn is_user_actionable(&self) -> bool {
        false // All notification errors are system-level
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
