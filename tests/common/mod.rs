//! Common test utilities and helpers
//!
//! A plugin with a configurable processing time, plus event helpers over the
//! public notification API.

#![allow(dead_code)]

use plugview::notifications::api::{
    new_notification_service, Event, EventFilter, EventReceiver, SharedNotificationManager,
    TaskEvent,
};
use plugview::plugin::api::{
    is_empty_image, Artifact, ColorSpace, Image, ImagePlugin, PluginConfig, PluginError,
    PluginResult, PluginStatus,
};
use plugview::task::api::TaskManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

pub const EVENT_WAIT: Duration = Duration::from_secs(5);

/// Plugin whose `fetch` sleeps before copying its input
pub struct SleepyPlugin {
    name: String,
    delay: Duration,
    status: PluginStatus,
    result: Option<Image>,
    deinit_calls: Arc<AtomicUsize>,
}

impl SleepyPlugin {
    pub fn new(name: &str, delay: Duration) -> Self {
        Self {
            name: name.to_string(),
            delay,
            status: PluginStatus::Processing,
            result: None,
            deinit_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `deinit` calls, readable after the plugin is boxed
    pub fn deinit_counter(&self) -> Arc<AtomicUsize> {
        self.deinit_calls.clone()
    }
}

impl ImagePlugin for SleepyPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _config: &PluginConfig) {
        self.status = PluginStatus::Ready;
    }

    fn update_config(&mut self, _config: &PluginConfig) {}

    fn deinit(&mut self) {
        self.deinit_calls.fetch_add(1, Ordering::SeqCst);
        self.result = None;
        self.status = PluginStatus::Ready;
    }

    fn fetch(&mut self, image: &Image) -> PluginResult<()> {
        std::thread::sleep(self.delay);
        if is_empty_image(image) {
            self.status = PluginStatus::Error;
            return Err(PluginError::EmptyInput {
                plugin_name: self.name.clone(),
                operation: "fetch".to_string(),
            });
        }
        self.result = Some(image.clone());
        self.status = PluginStatus::Done;
        Ok(())
    }

    fn get(&self) -> Option<Artifact<'_>> {
        self.result.as_ref().map(|image| Artifact::Image {
            space: ColorSpace::Rgb,
            image,
        })
    }

    fn render_result(&mut self, input: &Image, output: &mut Image) -> PluginResult<()> {
        if is_empty_image(input) {
            self.status = PluginStatus::Error;
            return Err(PluginError::EmptyInput {
                plugin_name: self.name.clone(),
                operation: "render_result".to_string(),
            });
        }
        *output = input.clone();
        Ok(())
    }

    fn cleanup(&mut self) {
        self.result = None;
    }

    fn status(&mut self, status: PluginStatus, _message: &str) {
        self.status = status;
    }

    fn current_status(&self) -> PluginStatus {
        self.status
    }
}

pub fn valid_image() -> Image {
    Image::from_pixel(8, 8, image::Rgb([10, 200, 90]))
}

/// Manager on the current runtime plus a receiver of its task events
pub fn task_manager() -> (TaskManager, SharedNotificationManager, EventReceiver) {
    let notifier = new_notification_service();
    let receiver = notifier.lock().unwrap().subscribe(
        "integration".to_string(),
        EventFilter::TaskOnly,
        "tests".to_string(),
    );
    let manager = TaskManager::new(Handle::current(), notifier.clone());
    (manager, notifier, receiver)
}

pub async fn next_task_event(receiver: &mut EventReceiver) -> TaskEvent {
    match tokio::time::timeout(EVENT_WAIT, receiver.recv()).await {
        Ok(Some(Event::Task(event))) => event,
        other => panic!("expected a task event, got {:?}", other),
    }
}

/// True when no event arrives within `window`
pub async fn stays_quiet(receiver: &mut EventReceiver, window: Duration) -> bool {
    tokio::time::timeout(window, receiver.recv()).await.is_err()
}
