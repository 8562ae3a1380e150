//! Public API for the notification system
//!
//! External modules should import from here rather than directly from
//! internal modules.

use std::sync::{Arc, Mutex};

// Core event types and enums
pub use crate::notifications::event::{
    Event, EventFilter, PluginEvent, PluginEventType, SystemEvent, SystemEventType, TaskEvent,
    TaskEventType,
};

// Manager and utilities
pub use crate::notifications::error::NotificationError;
pub use crate::notifications::manager::{forward_events, EventReceiver, NotificationManager};

// Traits and statistics
pub use crate::notifications::traits::{Subscriber, SubscriberStatistics};

/// Notification service shared between the task manager and its observers
pub type SharedNotificationManager = Arc<Mutex<NotificationManager>>;

/// Create a fresh shared notification service
pub fn new_notification_service() -> SharedNotificationManager {
    log::trace!("Creating notification service");
    Arc::new(Mutex::new(NotificationManager::new()))
}
