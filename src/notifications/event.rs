//! Event types for the notification system

use std::sync::Arc;
use std::time::SystemTime;

use crate::plugin::types::{Image, PluginStatus};
use crate::task::task::{TaskId, TaskOutput};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskEventType {
    /// Dispatch accepted and the worker spawned
    Started,
    /// Task reached a terminal state, completed or cancelled
    Finished,
    /// Worker reported a plugin status
    StatusChanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PluginEventType {
    Registered,
    Unloaded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemEventType {
    Startup,
    Shutdown,
}

/// Lifecycle event for one task
#[derive(Clone, Debug)]
pub struct TaskEvent {
    pub event_type: TaskEventType,
    pub timestamp: SystemTime,
    pub model_index: usize,
    pub task_id: TaskId,
    pub status: Option<PluginStatus>,
    pub message: Option<String>,
    pub output: TaskOutput,
}

impl TaskEvent {
    pub fn started(model_index: usize, task_id: TaskId) -> Self {
        Self {
            event_type: TaskEventType::Started,
            timestamp: SystemTime::now(),
            model_index,
            task_id,
            status: None,
            message: None,
            output: None,
        }
    }

    pub fn finished(model_index: usize, task_id: TaskId, output: TaskOutput) -> Self {
        Self {
            event_type: TaskEventType::Finished,
            timestamp: SystemTime::now(),
            model_index,
            task_id,
            status: None,
            message: None,
            output,
        }
    }

    pub fn status_changed(
        model_index: usize,
        task_id: TaskId,
        status: PluginStatus,
        message: String,
    ) -> Self {
        Self {
            event_type: TaskEventType::StatusChanged,
            timestamp: SystemTime::now(),
            model_index,
            task_id,
            status: Some(status),
            message: Some(message),
            output: None,
        }
    }

    /// Result image carried by a `Finished` event, if any
    pub fn output_image(&self) -> Option<&Arc<Image>> {
        self.output.as_ref()
    }
}

/// Registry change for one plugin
#[derive(Clone, Debug)]
pub struct PluginEvent {
    pub event_type: PluginEventType,
    pub timestamp: SystemTime,
    pub plugin_name: String,
    pub index: usize,
}

impl PluginEvent {
    pub fn new(event_type: PluginEventType, plugin_name: String, index: usize) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            plugin_name,
            index,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SystemEvent {
    pub event_type: SystemEventType,
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl SystemEvent {
    pub fn new(event_type: SystemEventType) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: None,
        }
    }

    pub fn with_message(event_type: SystemEventType, message: String) -> Self {
        Self {
            event_type,
            timestamp: SystemTime::now(),
            message: Some(message),
        }
    }
}

/// Unified event enum that encompasses all event types
#[derive(Clone, Debug)]
pub enum Event {
    Task(TaskEvent),
    Plugin(PluginEvent),
    System(SystemEvent),
}

impl Event {
    /// Short kind label used in logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Task(_) => "Task",
            Event::Plugin(_) => "Plugin",
            Event::System(_) => "System",
        }
    }
}

/// Event filtering options for subscribers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventFilter {
    TaskOnly,
    PluginOnly,
    SystemOnly,
    TaskAndPlugin,
    All,
}

impl EventFilter {
    /// Check if an event should be accepted by this filter
    pub fn accepts(&self, event: &Event) -> bool {
        matches!(
            (self, event),
            (EventFilter::TaskOnly, Event::Task(_))
                | (EventFilter::PluginOnly, Event::Plugin(_))
                | (EventFilter::SystemOnly, Event::System(_))
                | (EventFilter::TaskAndPlugin, Event::Task(_))
                | (EventFilter::TaskAndPlugin, Event::Plugin(_))
                | (EventFilter::All, _)
        )
    }
}
