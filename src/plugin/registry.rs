//! Plugin Registry
//!
//! Ordered collection of loaded plugins. Positions in the sequence are the
//! `model_index` callers use to address a plugin; they stay stable until the
//! whole set is reloaded.
//!
//! The registry itself is not synchronised. It is owned by the task manager
//! and only touched while the manager's lock is held. Nothing in here waits
//! on a plugin's own lock except `add_plugin`, whose instance is not shared
//! yet.

use crate::core::sync::lock_recovering;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::ImagePlugin;
use crate::plugin::types::{Image, PluginConfig, PluginStatus, PluginSummary};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared reference to one loaded plugin
///
/// Cloning the handle is cheap; every clone addresses the same instance and
/// serialises calls through the instance's own mutex. The last status the
/// plugin reported is cached next to it, so reading it never waits on a
/// running call.
#[derive(Clone)]
pub struct PluginHandle {
    name: Arc<str>,
    inner: Arc<Mutex<Box<dyn ImagePlugin>>>,
    status: Arc<Mutex<PluginStatus>>,
    dispatch: Arc<AtomicU64>,
}

impl std::fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHandle")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Exclusive access to a plugin instance
///
/// Releasing the guard records the plugin's current status in its handle.
pub struct PluginGuard<'a> {
    instance: MutexGuard<'a, Box<dyn ImagePlugin>>,
    status: &'a Mutex<PluginStatus>,
}

impl Deref for PluginGuard<'_> {
    type Target = dyn ImagePlugin;

    fn deref(&self) -> &Self::Target {
        &**self.instance
    }
}

impl DerefMut for PluginGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.instance
    }
}

impl Drop for PluginGuard<'_> {
    fn drop(&mut self) {
        *lock_recovering(self.status, "plugin status") = self.instance.current_status();
    }
}

impl PluginHandle {
    pub fn new(plugin: Box<dyn ImagePlugin>) -> Self {
        let status = plugin.current_status();
        Self {
            name: Arc::from(plugin.name()),
            inner: Arc::new(Mutex::new(plugin)),
            status: Arc::new(Mutex::new(status)),
            dispatch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Name captured at registration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exclusive access to the plugin instance, waiting for any running call
    pub fn lock(&self) -> PluginGuard<'_> {
        PluginGuard {
            instance: lock_recovering(&self.inner, &self.name),
            status: &self.status,
        }
    }

    /// Status as of the last completed call into the plugin
    pub fn status(&self) -> PluginStatus {
        *lock_recovering(&self.status, "plugin status")
    }

    /// Direct render call used by the display path, bypassing the scheduler
    pub fn render_result(&self, input: &Image, output: &mut Image) -> PluginResult<()> {
        self.lock().render_result(input, output)
    }

    /// Record that work tagged `dispatch` was handed to this plugin
    pub fn mark_dispatched(&self, dispatch: u64) {
        self.dispatch.store(dispatch, Ordering::Release);
    }

    /// True when no work was handed over after `dispatch`
    pub fn is_latest_dispatch(&self, dispatch: u64) -> bool {
        self.dispatch.load(Ordering::Acquire) == dispatch
    }

    /// Deinitialise the instance once any running call has returned
    pub fn release(&self) {
        self.lock().deinit();
        log::debug!("Plugin '{}' deinitialised and released", self.name);
    }
}

/// Plugin registry for managing loaded plugins
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginHandle>,
}

impl PluginRegistry {
    /// Create a new empty plugin registry
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin and initialise it with the default configuration
    ///
    /// Returns the index the plugin is addressed by.
    pub fn add_plugin(&mut self, plugin: Box<dyn ImagePlugin>) -> usize {
        let handle = PluginHandle::new(plugin);
        handle.lock().init(&PluginConfig::default());

        let index = self.plugins.len();
        log::info!("Plugin '{}' added at index {} and initialised", handle.name(), index);
        self.plugins.push(handle);
        index
    }

    /// Get a plugin by index
    pub fn get(&self, index: usize) -> PluginResult<&PluginHandle> {
        self.plugins
            .get(index)
            .ok_or(PluginError::PluginNotFound {
                index,
                count: self.plugins.len(),
            })
    }

    /// Check whether `index` addresses a loaded plugin
    pub fn contains(&self, index: usize) -> bool {
        index < self.plugins.len()
    }

    /// Get total count of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Snapshot of the loaded handles in index order
    pub fn plugins(&self) -> Vec<PluginHandle> {
        self.plugins.clone()
    }

    /// Listing rows with the last reported status of each plugin
    pub fn list(&self) -> Vec<PluginSummary> {
        self.plugins
            .iter()
            .enumerate()
            .map(|(index, handle)| PluginSummary {
                index,
                name: handle.name().to_string(),
                status: handle.status(),
            })
            .collect()
    }

    /// Empty the registry, handing back every handle for release
    ///
    /// The caller deinitialises each handle exactly once with
    /// [`PluginHandle::release`], outside any lock of its own.
    pub fn take_all(&mut self) -> Vec<PluginHandle> {
        std::mem::take(&mut self.plugins)
    }
}
