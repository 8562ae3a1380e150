//! Plugin Test Utilities
//!
//! Configurable mock plugin shared by the registry, loader and task manager
//! test suites.

use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::ImagePlugin;
use crate::plugin::types::{is_empty_image, Artifact, ColorSpace, Image, PluginConfig, PluginStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Call counters that stay observable after the plugin is boxed
#[derive(Debug, Clone, Default)]
pub struct MockCounters {
    init: Arc<AtomicUsize>,
    deinit: Arc<AtomicUsize>,
    fetch: Arc<AtomicUsize>,
    cleanup: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<PluginConfig>>>,
}

impl MockCounters {
    pub fn init_calls(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }

    pub fn deinit_calls(&self) -> usize {
        self.deinit.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch.load(Ordering::SeqCst)
    }

    pub fn cleanup_calls(&self) -> usize {
        self.cleanup.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<PluginConfig> {
        self.last_config.lock().unwrap().clone()
    }
}

/// Mock plugin with optional processing delay and failure injection
#[derive(Debug)]
pub struct MockPlugin {
    pub name: String,
    pub status: PluginStatus,
    pub artifact: Option<Image>,
    pub delay: Duration,
    pub fail_fetch: bool,
    counters: MockCounters,
}

impl MockPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: PluginStatus::Processing,
            artifact: None,
            delay: Duration::ZERO,
            fail_fetch: false,
            counters: MockCounters::default(),
        }
    }

    /// Make `fetch` block for `delay` before completing
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make `fetch` report a fatal failure
    pub fn with_fetch_failure(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn counters(&self) -> MockCounters {
        self.counters.clone()
    }
}

impl ImagePlugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, config: &PluginConfig) {
        self.counters.init.fetch_add(1, Ordering::SeqCst);
        *self.counters.last_config.lock().unwrap() = Some(config.clone());
        self.status = PluginStatus::Ready;
    }

    fn update_config(&mut self, config: &PluginConfig) {
        *self.counters.last_config.lock().unwrap() = Some(config.clone());
    }

    fn deinit(&mut self) {
        self.counters.deinit.fetch_add(1, Ordering::SeqCst);
        self.artifact = None;
        self.status = PluginStatus::Ready;
    }

    fn fetch(&mut self, image: &Image) -> PluginResult<()> {
        self.counters.fetch.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if is_empty_image(image) {
            self.status = PluginStatus::Error;
            return Err(PluginError::EmptyInput {
                plugin_name: self.name.clone(),
                operation: "fetch".to_string(),
            });
        }
        if self.fail_fetch {
            self.status = PluginStatus::Fatal;
            return Err(PluginError::ExecutionError {
                plugin_name: self.name.clone(),
                operation: "fetch".to_string(),
                cause: "Mock fetch failure".to_string(),
            });
        }
        self.artifact = Some(image.clone());
        self.status = PluginStatus::Done;
        Ok(())
    }

    fn get(&self) -> Option<Artifact<'_>> {
        self.artifact.as_ref().map(|image| Artifact::Image {
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
        self.status = PluginStatus::Done;
        Ok(())
    }

    fn cleanup(&mut self) {
        self.counters.cleanup.fetch_add(1, Ordering::SeqCst);
        self.artifact = None;
    }

    fn status(&mut self, status: PluginStatus, _message: &str) {
        self.status = status;
    }

    fn current_status(&self) -> PluginStatus {
        self.status
    }
}

/// Solid-colour test image
pub fn test_image(width: u32, height: u32) -> Image {
    Image::from_pixel(width, height, image::Rgb([200, 40, 40]))
}
