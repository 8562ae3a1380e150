//! Plugin Loading Tests
//!
//! Descriptor files resolved into a task manager's registry.

use crate::notifications::api::{new_notification_service, Event, EventFilter, PluginEventType};
use crate::plugin::loader::{load_plugins, PluginDescriptor};
use crate::plugin::tests::utils::test_image;
use crate::plugin::types::PluginStatus;
use crate::task::manager::TaskManager;
use std::io::Write;
use std::path::Path;
use tokio::runtime::Handle;

fn write_descriptor(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_load_plugins_from_file() {
    let file = write_descriptor(
        "plugins:\n  - pluginpath: ../plugins/libhsv_plugin.so\n  - pluginpath: /opt/libmissing_plugin.so\n",
    );
    let descriptor = PluginDescriptor::from_file(file.path()).await.unwrap();
    assert_eq!(descriptor.plugin_paths.len(), 2);
    assert_eq!(descriptor.source.as_deref(), Some(file.path()));

    let manager = TaskManager::new(Handle::current(), new_notification_service());
    let loaded = load_plugins(&manager, &descriptor, Path::new("/srv/viewer"));

    assert_eq!(loaded, 1);
    let summaries = manager.list_plugins();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "HSV Plugin");
    assert_eq!(summaries[0].status, PluginStatus::Ready);
}

#[tokio::test]
async fn test_reload_replaces_previous_set() {
    let notifier = new_notification_service();
    let mut receiver = notifier.lock().unwrap().subscribe(
        "loading".to_string(),
        EventFilter::PluginOnly,
        "plugin::tests".to_string(),
    );
    let manager = TaskManager::new(Handle::current(), notifier.clone());

    let twice = PluginDescriptor::parse("- pluginpath: hsv\n- pluginpath: libhsv_plugin.so");
    assert_eq!(load_plugins(&manager, &twice, Path::new(".")), 2);

    let once = PluginDescriptor::parse("- pluginpath: hsv_plugin.dll");
    assert_eq!(load_plugins(&manager, &once, Path::new(".")), 1);
    assert_eq!(manager.plugin_count(), 1);

    let mut kinds = Vec::new();
    while let Ok(Event::Plugin(event)) = receiver.try_recv() {
        kinds.push((event.event_type, event.index));
    }
    assert_eq!(
        kinds,
        vec![
            (PluginEventType::Registered, 0),
            (PluginEventType::Registered, 1),
            (PluginEventType::Unloaded, 0),
            (PluginEventType::Unloaded, 1),
            (PluginEventType::Registered, 0),
        ]
    );
}

#[tokio::test]
async fn test_empty_descriptor_loads_nothing() {
    let manager = TaskManager::new(Handle::current(), new_notification_service());
    let loaded = load_plugins(&manager, &PluginDescriptor::parse("# no entries"), Path::new("."));
    assert_eq!(loaded, 0);
    assert_eq!(manager.plugin_count(), 0);
}

#[tokio::test]
async fn test_loaded_plugin_renders_directly() {
    let manager = TaskManager::new(Handle::current(), new_notification_service());
    load_plugins(&manager, &PluginDescriptor::parse("- pluginpath: hsv"), Path::new("."));

    let input = test_image(3, 2);
    let mut output = crate::plugin::types::Image::new(0, 0);
    let handles = manager.plugins();
    handles[0].render_result(&input, &mut output).unwrap();

    assert_eq!(output.dimensions(), (3, 2));
    assert_eq!(handles[0].status(), PluginStatus::Done);
}
