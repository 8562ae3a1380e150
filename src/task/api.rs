//! Public API for the task scheduler

pub use crate::task::error::{TaskError, TaskResult};
pub use crate::task::manager::TaskManager;
pub use crate::task::task::{TaskId, TaskOutput};
