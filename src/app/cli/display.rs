//! CLI display utilities for formatting output

use crate::notifications::api::{TaskEvent, TaskEventType};
use crate::plugin::types::{PluginStatus, PluginSummary};
use colored::Colorize;
use prettytable::{format, row, Table};

/// Plugin listing as a borderless table
pub fn plugin_table(plugins: &[PluginSummary]) -> String {
    if plugins.is_empty() {
        return "No plugins loaded.\n".to_string();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.set_titles(row!["#", "Plugin", "Status"]);
    for plugin in plugins {
        table.add_row(row![r->plugin.index, plugin.name, plugin.status]);
    }
    table.to_string()
}

fn status_label(status: PluginStatus, use_color: bool) -> String {
    let label = status.to_string();
    if !use_color {
        return label;
    }
    match status {
        PluginStatus::Done => label.green().to_string(),
        PluginStatus::Timeout => label.yellow().to_string(),
        status if status.is_failure() => label.red().bold().to_string(),
        _ => label.blue().to_string(),
    }
}

/// One-line rendering of a task lifecycle event
pub fn format_task_event(event: &TaskEvent, use_color: bool) -> String {
    let prefix = format!("task {} [plugin {}]", event.task_id, event.model_index);
    match event.event_type {
        TaskEventType::Started => format!("{} started", prefix),
        TaskEventType::StatusChanged => {
            let status = event
                .status
                .map(|status| format!("{} ({})", status_label(status, use_color), status.code()))
                .unwrap_or_default();
            format!(
                "{} status {}: {}",
                prefix,
                status,
                event.message.as_deref().unwrap_or_default()
            )
        }
        TaskEventType::Finished => match event.output_image() {
            Some(image) => format!(
                "{} finished with a {}x{} result",
                prefix,
                image.width(),
                image.height()
            ),
            None => format!("{} finished without a result", prefix),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::types::Image;
    use crate::task::api::TaskId;
    use serial_test::serial;
    use std::sync::Arc;

    #[test]
    fn test_plugin_table_lists_rows() {
        let table = plugin_table(&[
            PluginSummary {
                index: 0,
                name: "HSV Plugin".to_string(),
                status: PluginStatus::Ready,
            },
            PluginSummary {
                index: 1,
                name: "Edge Plugin".to_string(),
                status: PluginStatus::Done,
            },
        ]);
        assert!(table.contains("Plugin"));
        assert!(table.contains("HSV Plugin"));
        assert!(table.contains("Edge Plugin"));
        assert!(table.contains("ready"));
        assert!(table.contains("done"));
    }

    #[test]
    fn test_empty_plugin_table() {
        assert_eq!(plugin_table(&[]), "No plugins loaded.\n");
    }

    #[test]
    #[serial]
    fn test_failure_labels_are_coloured() {
        colored::control::set_override(true);
        let fatal = status_label(PluginStatus::Fatal, true);
        let ready = status_label(PluginStatus::Ready, true);
        colored::control::unset_override();

        assert_ne!(fatal, "fatal");
        assert!(fatal.contains("fatal"));
        assert_ne!(fatal, ready);
        assert_eq!(status_label(PluginStatus::Fatal, false), "fatal");
    }

    #[test]
    fn test_format_task_events() {
        let id = TaskId::new(3);
        assert_eq!(
            format_task_event(&TaskEvent::started(1, id), false),
            "task #3 [plugin 1] started"
        );
        assert_eq!(
            format_task_event(
                &TaskEvent::status_changed(1, id, PluginStatus::Done, "Task completed".to_string()),
                false
            ),
            "task #3 [plugin 1] status done (2): Task completed"
        );
        assert_eq!(
            format_task_event(
                &TaskEvent::status_changed(
                    0,
                    id,
                    PluginStatus::Timeout,
                    "Task timed out after 50ms".to_string()
                ),
                false
            ),
            "task #3 [plugin 0] status timeout (5): Task timed out after 50ms"
        );
        assert_eq!(
            format_task_event(
                &TaskEvent::finished(1, id, Some(Arc::new(Image::new(4, 2)))),
                false
            ),
            "task #3 [plugin 1] finished with a 4x2 result"
        );
        assert_eq!(
            format_task_event(&TaskEvent::finished(1, id, None), false),
            "task #3 [plugin 1] finished without a result"
        );
    }
}
