//! Task values
//!
//! A `Task` is the scheduler's record of one dispatched unit of work. It is
//! only mutated while the task manager's lock is held.

use crate::plugin::types::Image;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Identifier handed out by the scheduler, increasing per manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result carried by a `finished` event: `None` on cancellation or failure
pub type TaskOutput = Option<Arc<Image>>;

#[derive(Debug)]
pub struct Task {
    id: TaskId,
    model_index: usize,
    handle: Option<JoinHandle<()>>,
    cancel: Arc<Notify>,
    running: bool,
}

impl Task {
    /// New task in the running state
    pub fn new(id: TaskId, model_index: usize, cancel: Arc<Notify>) -> Self {
        Self {
            id,
            model_index,
            handle: None,
            cancel,
            running: true,
        }
    }

    pub fn attach(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn model_index(&self) -> usize {
        self.model_index
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once the worker has exited or when none was attached
    pub fn worker_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Mark the task finished
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// racing completion and cancellation paths agree on who reports it.
    pub fn finish(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    /// Finish the task and wake its worker
    pub fn cancel(&mut self) -> bool {
        if !self.finish() {
            return false;
        }
        // notify_one stores a permit, so a worker that is not yet waiting
        // still observes the signal.
        self.cancel.notify_one();
        true
    }
}
