//! Application startup and command dispatch

use crate::app::cli::args::Args;
use crate::app::cli::display::{format_task_event, plugin_table};
use crate::app::cli::settings::{ResolvedOptions, Settings};
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::sync::lock_recovering;
use crate::core::version::version_banner;
use crate::notifications::api::{
    forward_events, new_notification_service, Event, EventFilter, SharedNotificationManager,
    Subscriber, SystemEvent, SystemEventType, TaskEventType,
};
use crate::plugin::api::{load_plugins, Image, PluginDescriptor, PluginError};
use crate::task::api::{TaskError, TaskId, TaskManager};
use async_trait::async_trait;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const EVENT_LOG_SUBSCRIBER: &str = "event-log";
const CLI_SUBSCRIBER: &str = "cli";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Failed to read image '{}': {}", .path.display(), .cause)]
    ImageRead { path: PathBuf, cause: String },

    #[error("Failed to write image '{}': {}", .path.display(), .cause)]
    ImageWrite { path: PathBuf, cause: String },

    #[error("Task {0} finished without a result")]
    NoResult(TaskId),

    #[error("Interrupted before the task finished")]
    Interrupted,

    #[error("Event channel closed before the task finished")]
    ChannelClosed,
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Plugin(e) => e.is_user_actionable(),
            AppError::Task(e) => e.is_user_actionable(),
            AppError::ImageRead { .. } | AppError::ImageWrite { .. } | AppError::NoResult(_) => true,
            AppError::Interrupted | AppError::ChannelClosed => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Plugin(e) => e.user_message(),
            AppError::Task(e) => e.user_message(),
            AppError::ImageRead { .. } => Some("The input image could not be read"),
            AppError::ImageWrite { .. } => Some("The result image could not be written"),
            AppError::NoResult(_) => Some("The plugin did not produce a result"),
            AppError::Interrupted | AppError::ChannelClosed => None,
        }
    }
}

/// Logs every published event at debug level
struct EventLogSubscriber;

#[async_trait]
impl Subscriber for EventLogSubscriber {
    async fn handle_event(
        &self,
        event: Event,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match &event {
            Event::Task(task) => log::debug!(
                "event: task {} {:?} on plugin {}",
                task.task_id,
                task.event_type,
                task.model_index
            ),
            Event::Plugin(plugin) => log::debug!(
                "event: plugin '{}' {:?} at index {}",
                plugin.plugin_name,
                plugin.event_type,
                plugin.index
            ),
            Event::System(system) => log::debug!(
                "event: system {:?} {}",
                system.event_type,
                system.message.as_deref().unwrap_or_default()
            ),
        }
        Ok(())
    }

    fn subscriber_id(&self) -> &str {
        EVENT_LOG_SUBSCRIBER
    }

    fn source(&self) -> &str {
        "app::startup"
    }
}

/// Parse arguments, set up logging and run the requested command
///
/// Returns the process exit code.
pub async fn startup() -> i32 {
    let args = Args::parse();

    // Logging is not up yet, so settings errors go straight to stderr.
    let settings = match Settings::load(args.config_file.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let options = ResolvedOptions::resolve(&args, &settings);
    let use_color = args.use_color();

    if let Err(e) = init_logging(
        options.log_level.as_deref(),
        options.log_format,
        options.log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Error: {}", e);
        return 1;
    }
    log::info!("{} starting", version_banner());

    match run(&args, &options, use_color).await {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, "plugview");
            1
        }
    }
}

async fn run(args: &Args, options: &ResolvedOptions, use_color: bool) -> Result<(), AppError> {
    let notifier = new_notification_service();
    let event_log = {
        let receiver = lock_recovering(&notifier, "notification manager").subscribe(
            EVENT_LOG_SUBSCRIBER.to_string(),
            EventFilter::All,
            "app::startup".to_string(),
        );
        tokio::spawn(forward_events(receiver, Arc::new(EventLogSubscriber)))
    };

    let manager = TaskManager::new(Handle::current(), notifier.clone());
    load_descriptor(&manager, &options.descriptor).await;
    if let Some(config) = &options.plugin_config {
        for index in 0..manager.plugin_count() {
            manager.update_config(index, config)?;
        }
    }
    publish_system(&notifier, SystemEventType::Startup, "plugins loaded");

    let result = if args.list {
        print!("{}", plugin_table(&manager.list_plugins()));
        Ok(())
    } else if let Some(input) = &args.render {
        render_command(&manager, input, &args.select, args.output.as_deref())
    } else if let Some(input) = &args.run {
        let command = RunCommand {
            input,
            model_index: args.model,
            timeout: options.timeout,
            output: args.output.as_deref(),
            use_color,
        };
        command.execute(&manager, &notifier).await
    } else {
        print!("{}", plugin_table(&manager.list_plugins()));
        Ok(())
    };

    manager.shutdown();
    publish_system(&notifier, SystemEventType::Shutdown, "plugins released");

    // Closing the subscription lets the logger drain and stop.
    if close_subscription(&notifier, EVENT_LOG_SUBSCRIBER) {
        if let Ok(handled) = event_log.await {
            log::trace!("Event log handled {} event(s)", handled);
        }
    }
    result
}

/// Log delivery statistics for `subscriber_id`, then unsubscribe it
///
/// Returns false when the subscriber was already gone.
fn close_subscription(notifier: &SharedNotificationManager, subscriber_id: &str) -> bool {
    let mut manager = lock_recovering(notifier, "notification manager");
    if let Some(stats) = manager.get_subscriber_statistics(subscriber_id) {
        log::debug!(
            "Subscriber '{}': {} event(s) delivered, {} filtered, last {:?} ago",
            subscriber_id,
            stats.events_delivered(),
            stats.events_filtered(),
            stats.last_event_time().map(|at| at.elapsed())
        );
    }
    manager.unsubscribe(subscriber_id).is_ok()
}

fn publish_system(notifier: &SharedNotificationManager, event_type: SystemEventType, message: &str) {
    let event = Event::System(SystemEvent::with_message(event_type, message.to_string()));
    if let Err(e) = lock_recovering(notifier, "notification manager").publish(event) {
        log::debug!("{}", e);
    }
}

/// Load the descriptor into `manager`
///
/// Relative plugin paths resolve against the working directory. A missing
/// or unreadable descriptor leaves the registry empty; the commands that
/// need a plugin then fail with an index error.
async fn load_descriptor(manager: &TaskManager, path: &Path) -> usize {
    match PluginDescriptor::from_file(path).await {
        Ok(descriptor) => {
            let base_dir = std::env::current_dir().unwrap_or_else(|e| {
                log::warn!("Working directory unavailable ({}), using '.'", e);
                PathBuf::from(".")
            });
            load_plugins(manager, &descriptor, &base_dir)
        }
        Err(e) => {
            log::error!("{}", e);
            0
        }
    }
}

fn read_image(path: &Path) -> Result<Image, AppError> {
    image::open(path)
        .map(|image| image.to_rgb8())
        .map_err(|e| AppError::ImageRead {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
}

fn write_image(image: &Image, path: &Path) -> Result<(), AppError> {
    image.save(path).map_err(|e| AppError::ImageWrite {
        path: path.to_path_buf(),
        cause: e.to_string(),
    })?;
    log::info!("Wrote {}x{} result to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Chain `render_result` over the selected plugins, all of them by default
pub fn render_chain(manager: &TaskManager, input: &Image, select: &[usize]) -> Result<Image, AppError> {
    let handles = manager.plugins();
    let indices: Vec<usize> = if select.is_empty() {
        (0..handles.len()).collect()
    } else {
        select.to_vec()
    };

    let mut current = input.clone();
    for index in indices {
        let handle = handles.get(index).ok_or(PluginError::PluginNotFound {
            index,
            count: handles.len(),
        })?;
        let mut output = Image::new(0, 0);
        handle.render_result(&current, &mut output)?;
        log::debug!("Rendered through '{}'", handle.name());
        current = output;
    }
    Ok(current)
}

fn render_command(
    manager: &TaskManager,
    input: &Path,
    select: &[usize],
    output: Option<&Path>,
) -> Result<(), AppError> {
    let image = read_image(input)?;
    let rendered = render_chain(manager, &image, select)?;
    match output {
        Some(path) => write_image(&rendered, path),
        None => {
            println!("Rendered {}x{} image", rendered.width(), rendered.height());
            Ok(())
        }
    }
}

/// `--run`: one task through the scheduler, events printed as they arrive
struct RunCommand<'a> {
    input: &'a Path,
    model_index: usize,
    timeout: Duration,
    output: Option<&'a Path>,
    use_color: bool,
}

impl RunCommand<'_> {
    async fn execute(
        &self,
        manager: &TaskManager,
        notifier: &SharedNotificationManager,
    ) -> Result<(), AppError> {
        let image = read_image(self.input)?;

        let (shutdown, mut shutdown_rx) = ShutdownCoordinator::new();
        let signals = shutdown.listen_for_signals();

        let mut events = lock_recovering(notifier, "notification manager").subscribe(
            CLI_SUBSCRIBER.to_string(),
            EventFilter::TaskOnly,
            "app::startup".to_string(),
        );
        let task_id = manager.start_task(self.model_index, image, self.timeout)?;

        let mut interrupted = false;
        let output = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(Event::Task(event)) if event.task_id == task_id => {
                        println!("{}", format_task_event(&event, self.use_color));
                        if event.event_type == TaskEventType::Finished {
                            break event.output;
                        }
                    }
                    Some(_) => {}
                    None => break None,
                },
                Ok(()) = shutdown_rx.recv(), if !interrupted => {
                    log::warn!("Interrupted, cancelling running tasks");
                    interrupted = true;
                    manager.cancel_all();
                }
            }
        };
        signals.stop().await;
        let channel_open = close_subscription(notifier, CLI_SUBSCRIBER);

        match (output, self.output) {
            (Some(image), Some(path)) => write_image(&image, path),
            (Some(_), None) => Ok(()),
            (None, _) if interrupted => Err(AppError::Interrupted),
            (None, _) if !channel_open => Err(AppError::ChannelClosed),
            (None, _) => Err(AppError::NoResult(task_id)),
        }
    }
}
