//! Plugin Capability Contract
//!
//! Every image-processing module implements [`ImagePlugin`]. The registry
//! only ever stores trait objects, so the task manager treats stateless and
//! stateful plugins the same way.
//!
//! # Lifecycle
//!
//! `init` runs once when a plugin is registered and `deinit` runs once when
//! the registry is reloaded or torn down. Everything in between (`fetch`,
//! `get`, `render_result`, `cleanup`) is driven by the task worker or by the
//! display path, never concurrently: callers go through the handle's mutex.
//!
//! Plugins do NOT schedule work, own tasks, or publish events.

use crate::plugin::error::PluginResult;
use crate::plugin::types::{Artifact, Image, PluginConfig, PluginStatus};

/// Base trait that all image plugins must implement
pub trait ImagePlugin: Send {
    /// Stable human-readable identity, used for listing and logs
    fn name(&self) -> &str;

    /// One-time setup. Leaves the plugin `Ready`.
    fn init(&mut self, config: &PluginConfig);

    /// Apply new configuration without a full re-initialisation
    fn update_config(&mut self, config: &PluginConfig);

    /// Release owned buffers and return to `Ready`
    ///
    /// Must be safe to call more than once.
    fn deinit(&mut self);

    /// Derive and store an artifact from `image`
    ///
    /// An empty image sets the status to `Error` and returns
    /// `PluginError::EmptyInput`; success sets `Done`.
    fn fetch(&mut self, image: &Image) -> PluginResult<()>;

    /// Borrow the artifact produced by the last successful `fetch`
    fn get(&self) -> Option<Artifact<'_>>;

    /// Write the processed form of `input` into `output`
    ///
    /// Only the status may change on the plugin. On empty input `output`
    /// is left untouched.
    fn render_result(&mut self, input: &Image, output: &mut Image) -> PluginResult<()>;

    /// Drop transient buffers without deinitialising
    fn cleanup(&mut self);

    /// Status sink for the plugin itself or for a host forcing a transition
    fn status(&mut self, status: PluginStatus, message: &str);

    /// Current lifecycle status
    fn current_status(&self) -> PluginStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::tests::utils::MockPlugin;
    use crate::plugin::types::ColorSpace;

    #[test]
    fn test_mock_plugin_lifecycle() {
        let mut plugin = MockPlugin::new("mock");
        let counters = plugin.counters();

        plugin.init(&PluginConfig::default());
        assert_eq!(plugin.current_status(), PluginStatus::Ready);

        plugin.fetch(&Image::new(2, 2)).unwrap();
        assert_eq!(plugin.current_status(), PluginStatus::Done);
        match plugin.get() {
            Some(Artifact::Image { space, image }) => {
                assert_eq!(space, ColorSpace::Rgb);
                assert_eq!(image.dimensions(), (2, 2));
            }
            None => panic!("artifact should be stored after fetch"),
        }

        plugin.deinit();
        plugin.deinit();
        assert!(plugin.get().is_none());
        assert_eq!(counters.deinit_calls(), 2);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut plugins: Vec<Box<dyn ImagePlugin>> = vec![
            Box::new(MockPlugin::new("first")),
            Box::new(MockPlugin::new("second")),
        ];

        for plugin in plugins.iter_mut() {
            plugin.init(&PluginConfig::default());
            plugin.status(PluginStatus::Fatal, "forced by host");
        }

        let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(plugins
            .iter()
            .all(|p| p.current_status() == PluginStatus::Fatal));
    }
}
