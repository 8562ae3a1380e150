//! Notification System Module
//!
//! Typed publish/subscribe channel carrying task and plugin lifecycle
//! events from the task manager to observers.

// Internal modules - all access should go through api module
pub(crate) mod error;
pub(crate) mod event;
pub(crate) mod manager;
pub(crate) mod traits;

// Public API module - the only public interface for the notification system
pub mod api;
