//! Task Scheduler Module
//!
//! Single-active-task scheduler that dispatches plugin work onto the tokio
//! runtime and reports lifecycle events through the notification service.

// Internal modules - all access should go through api module
pub(crate) mod error;
pub(crate) mod manager;
pub(crate) mod task;

// Public API module - the only public interface for the task scheduler
pub mod api;
