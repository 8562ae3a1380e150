//! plugview: image-processing plugins behind a single-active-task scheduler

pub mod app;
pub mod core;
pub mod notifications;
pub mod plugin;
pub mod task;
