//! Task Manager
//!
//! Owns the plugin registry and the task list behind one mutex and allows a
//! single running task at a time. Entry points never wait for a worker; they
//! hold the lock only long enough to update bookkeeping and publish events.
//!
//! Events are published while the lock is held, which is what orders
//! `Started` before `StatusChanged` and `Finished` for every task. The
//! scheduler lock is never held while waiting on a plugin's lock: handles are
//! cloned or taken out under it and called after it is released. Workers
//! never take the scheduler lock while holding a plugin lock.

use crate::core::sync::lock_recovering;
use crate::notifications::api::{
    Event, PluginEvent, PluginEventType, SharedNotificationManager, TaskEvent,
};
use crate::plugin::error::PluginResult;
use crate::plugin::loader::PluginDescriptor;
use crate::plugin::registry::{PluginHandle, PluginRegistry};
use crate::plugin::traits::ImagePlugin;
use crate::plugin::types::{Image, PluginConfig, PluginStatus, PluginSummary};
use crate::task::error::{TaskError, TaskResult};
use crate::task::task::{Task, TaskId, TaskOutput};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;

const COMPLETED_MESSAGE: &str = "Task completed";

struct SchedulerState {
    registry: PluginRegistry,
    tasks: Vec<Task>,
    next_task_id: u64,
}

/// State shared between the manager and its workers
struct Shared {
    state: Mutex<SchedulerState>,
    notifier: SharedNotificationManager,
}

/// How a worker stopped waiting on its plugin
enum Outcome {
    Completed(TaskOutput),
    Failed(PluginStatus, String),
    TimedOut(Duration),
    Cancelled,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        lock_recovering(&self.state, "task manager")
    }

    fn publish(&self, event: Event) {
        let mut notifier = lock_recovering(&self.notifier, "notification manager");
        if let Err(e) = notifier.publish(event) {
            log::debug!("Event delivery incomplete: {}", e);
        }
    }

    fn is_running(&self, task_id: TaskId) -> bool {
        self.lock()
            .tasks
            .iter()
            .any(|task| task.id() == task_id && task.is_running())
    }

    /// Completion path shared by every worker outcome
    ///
    /// Reports only if the task is still running, then flips it to finished.
    /// A task already finished by cancellation is left alone.
    fn complete(&self, task_id: TaskId, outcome: Outcome) {
        let mut state = self.lock();
        let Some(task) = state.tasks.iter_mut().find(|task| task.id() == task_id) else {
            log::trace!("Task {} no longer tracked, dropping its outcome", task_id);
            return;
        };
        if !task.is_running() {
            log::debug!("Task {} already finished, dropping its outcome", task_id);
            return;
        }
        let model_index = task.model_index();

        let output = match outcome {
            Outcome::Completed(output) => {
                self.publish(Event::Task(TaskEvent::status_changed(
                    model_index,
                    task_id,
                    PluginStatus::Done,
                    COMPLETED_MESSAGE.to_string(),
                )));
                output
            }
            Outcome::Failed(status, message) => {
                log::warn!("Task {} on plugin {} failed: {}", task_id, model_index, message);
                self.publish(Event::Task(TaskEvent::status_changed(
                    model_index,
                    task_id,
                    status,
                    message,
                )));
                None
            }
            Outcome::TimedOut(timeout) => {
                let message = timeout_message(timeout);
                log::warn!("Task {} on plugin {}: {}", task_id, model_index, message);
                self.publish(Event::Task(TaskEvent::status_changed(
                    model_index,
                    task_id,
                    PluginStatus::Timeout,
                    message,
                )));
                None
            }
            Outcome::Cancelled => None,
        };

        if task.finish() {
            log::info!("Task {} on plugin {} finished", task_id, model_index);
            self.publish(Event::Task(TaskEvent::finished(model_index, task_id, output)));
        }
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!("Task timed out after {:?}", timeout)
}

/// Run one plugin `fetch` for `task_id` and report how it ended
async fn run_worker(
    shared: Arc<Shared>,
    task_id: TaskId,
    plugin: PluginHandle,
    image: Image,
    timeout: Duration,
    cancel: Arc<Notify>,
) {
    if !shared.is_running(task_id) {
        log::debug!("Task {} cancelled before its worker started", task_id);
        return;
    }

    let work_plugin = plugin.clone();
    let work = tokio::task::spawn_blocking(move || {
        let mut instance = work_plugin.lock();
        match instance.fetch(&image) {
            Ok(()) => Ok(instance.get().map(|artifact| Arc::new(artifact.to_image()))),
            Err(e) => Err((instance.current_status(), e.to_string())),
        }
    });

    let outcome = tokio::select! {
        biased;
        _ = cancel.notified() => Outcome::Cancelled,
        joined = tokio::time::timeout(timeout, work) => match joined {
            Ok(Ok(Ok(output))) => Outcome::Completed(output),
            Ok(Ok(Err((status, message)))) => Outcome::Failed(status, message),
            Ok(Err(join_error)) => Outcome::Failed(
                PluginStatus::Fatal,
                format!("Plugin '{}' worker aborted: {}", plugin.name(), join_error),
            ),
            Err(_) => Outcome::TimedOut(timeout),
        },
    };

    match outcome {
        Outcome::Cancelled => {
            log::debug!("Task {} stopped waiting on '{}' after cancellation", task_id, plugin.name());
            settle_abandoned(plugin, task_id, |instance| instance.cleanup());
        }
        Outcome::TimedOut(timeout) => {
            let message = timeout_message(timeout);
            settle_abandoned(plugin, task_id, move |instance| {
                instance.status(PluginStatus::Timeout, &message)
            });
            shared.complete(task_id, Outcome::TimedOut(timeout));
        }
        outcome => shared.complete(task_id, outcome),
    }
}

/// Apply `settle` once the abandoned call of `task_id` lets go of the plugin
///
/// Skipped when a newer task was dispatched to the plugin in the meantime,
/// so a late write never lands on that task's state.
fn settle_abandoned<F>(plugin: PluginHandle, task_id: TaskId, settle: F)
where
    F: FnOnce(&mut dyn ImagePlugin) + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut instance = plugin.lock();
        if plugin.is_latest_dispatch(task_id.value()) {
            settle(&mut *instance);
        } else {
            log::debug!(
                "Plugin '{}' was redispatched after task {}, leaving it alone",
                plugin.name(),
                task_id
            );
        }
    });
}

/// Single-active-task scheduler over a plugin registry
pub struct TaskManager {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("TaskManager")
            .field("plugins", &state.registry.len())
            .field("tasks", &state.tasks.len())
            .finish()
    }
}

impl TaskManager {
    /// Create a manager that spawns workers on `runtime` and publishes
    /// lifecycle events through `notifier`
    pub fn new(runtime: Handle, notifier: SharedNotificationManager) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState {
                    registry: PluginRegistry::new(),
                    tasks: Vec::new(),
                    next_task_id: 1,
                }),
                notifier,
            }),
            runtime,
        }
    }

    /// Dispatch `fetch` of `image` on plugin `model_index`
    ///
    /// Rejected, with a warning and no event, when the index is not loaded
    /// or another task is running. On success the `Started` event has been
    /// published by the time this returns.
    pub fn start_task(
        &self,
        model_index: usize,
        image: Image,
        timeout: Duration,
    ) -> TaskResult<TaskId> {
        let mut state = self.shared.lock();

        let plugin = match state.registry.get(model_index) {
            Ok(handle) => handle.clone(),
            Err(_) => {
                let err = TaskError::InvalidModelIndex {
                    index: model_index,
                    count: state.registry.len(),
                };
                log::warn!("Task not started: {}", err);
                return Err(err);
            }
        };

        if let Some(running) = state.tasks.iter().find(|task| task.is_running()) {
            let err = TaskError::AlreadyRunning {
                running: running.id(),
                model_index: running.model_index(),
            };
            log::warn!("Task not started: {}", err);
            return Err(err);
        }

        // No task is running past this point; drop the finished ones.
        for task in state.tasks.drain(..) {
            if !task.worker_finished() {
                log::trace!("Pruned task {} while its worker winds down", task.id());
            }
        }

        let task_id = TaskId::new(state.next_task_id);
        state.next_task_id += 1;

        plugin.mark_dispatched(task_id.value());
        let cancel = Arc::new(Notify::new());
        let mut task = Task::new(task_id, model_index, cancel.clone());
        log::info!(
            "Starting task {} on plugin {} '{}' (timeout {:?})",
            task_id,
            model_index,
            plugin.name(),
            timeout
        );
        let handle = self.runtime.spawn(run_worker(
            self.shared.clone(),
            task_id,
            plugin,
            image,
            timeout,
            cancel,
        ));
        task.attach(handle);
        state.tasks.push(task);

        self.shared
            .publish(Event::Task(TaskEvent::started(model_index, task_id)));
        Ok(task_id)
    }

    /// Cancel every running task on `model_index`
    ///
    /// Each cancelled task reports `Finished` with no output right away; its
    /// worker stops waiting on the plugin in the background. Returns the
    /// number of tasks cancelled.
    pub fn cancel_task(&self, model_index: usize) -> usize {
        let mut state = self.shared.lock();
        let cancelled = Self::cancel_matching(&self.shared, &mut state, |task| {
            task.model_index() == model_index
        });
        if cancelled == 0 {
            log::debug!("No running task on plugin {} to cancel", model_index);
        }
        cancelled
    }

    /// Cancel every running task and forget all tasks
    pub fn cancel_all(&self) -> usize {
        let mut state = self.shared.lock();
        let cancelled = Self::cancel_matching(&self.shared, &mut state, |_| true);
        state.tasks.clear();
        if cancelled > 0 {
            log::info!("Cancelled {} running task(s)", cancelled);
        }
        cancelled
    }

    fn cancel_matching(
        shared: &Shared,
        state: &mut SchedulerState,
        matches: impl Fn(&Task) -> bool,
    ) -> usize {
        let mut cancelled = 0;
        for task in state.tasks.iter_mut() {
            if matches(task) && task.cancel() {
                log::info!("Task {} on plugin {} cancelled", task.id(), task.model_index());
                shared.publish(Event::Task(TaskEvent::finished(
                    task.model_index(),
                    task.id(),
                    None,
                )));
                cancelled += 1;
            }
        }
        cancelled
    }

    /// True while any task is running
    pub fn is_task_running(&self) -> bool {
        self.shared.lock().tasks.iter().any(Task::is_running)
    }

    /// Number of tasks currently tracked, running or awaiting pruning
    pub fn task_count(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    /// Register `plugin`, initialising it with the default configuration
    pub fn add_plugin(&self, plugin: Box<dyn ImagePlugin>) -> usize {
        let mut state = self.shared.lock();
        let index = state.registry.add_plugin(plugin);
        if let Ok(handle) = state.registry.get(index) {
            self.shared.publish(Event::Plugin(PluginEvent::new(
                PluginEventType::Registered,
                handle.name().to_string(),
                index,
            )));
        }
        index
    }

    /// Replace the loaded set ahead of loading `descriptor`
    ///
    /// Running tasks are cancelled because their indices become invalid.
    /// Every loaded plugin is deinitialised exactly once and released; the
    /// caller then registers the new set with `add_plugin`.
    pub fn load_models(&self, descriptor: &PluginDescriptor) {
        let unloaded = {
            let mut state = self.shared.lock();
            log::info!("Loading plugin set from {}", descriptor.describe());
            Self::cancel_matching(&self.shared, &mut state, |_| true);
            state.tasks.clear();
            Self::unload_all(&self.shared, &mut state)
        };
        Self::release_all(unloaded);
    }

    /// Empty the registry and announce each plugin as unloaded
    fn unload_all(shared: &Shared, state: &mut SchedulerState) -> Vec<PluginHandle> {
        let unloaded = state.registry.take_all();
        for (index, handle) in unloaded.iter().enumerate() {
            shared.publish(Event::Plugin(PluginEvent::new(
                PluginEventType::Unloaded,
                handle.name().to_string(),
                index,
            )));
        }
        unloaded
    }

    /// Deinitialise unloaded plugins; must run without the scheduler lock
    fn release_all(unloaded: Vec<PluginHandle>) {
        for handle in &unloaded {
            handle.release();
        }
        if !unloaded.is_empty() {
            log::debug!("Released {} plugin(s)", unloaded.len());
        }
    }

    /// Handles to every loaded plugin, in index order
    pub fn plugins(&self) -> Vec<PluginHandle> {
        self.shared.lock().registry.plugins()
    }

    pub fn list_plugins(&self) -> Vec<PluginSummary> {
        self.shared.lock().registry.list()
    }

    pub fn plugin_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// Forward `config` to one plugin, after any call it is running
    pub fn update_config(&self, model_index: usize, config: &PluginConfig) -> PluginResult<()> {
        let handle = self.shared.lock().registry.get(model_index)?.clone();
        handle.lock().update_config(config);
        log::debug!("Updated configuration of plugin '{}'", handle.name());
        Ok(())
    }

    /// Cancel all tasks, then deinitialise and release every plugin
    ///
    /// Safe to call more than once; `Drop` calls it as well.
    pub fn shutdown(&self) {
        let (cancelled, unloaded) = {
            let mut state = self.shared.lock();
            let cancelled = Self::cancel_matching(&self.shared, &mut state, |_| true);
            state.tasks.clear();
            (cancelled, Self::unload_all(&self.shared, &mut state))
        };
        Self::release_all(unloaded);
        if cancelled > 0 {
            log::info!("Task manager shut down, {} task(s) cancelled", cancelled);
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
