//! Logging setup on top of `flexi_logger`
//!
//! Three line formats are supported:
//! - `text`: timestamp, level and message
//! - `ext`: `text` plus the source location (`task/manager.rs:120`)
//! - `json`: one compact JSON object per line
//!
//! Format, destination, level and colour are fixed at startup. The logger
//! handle is kept for the life of the process so file output stays open.

use flexi_logger::{DeferredNow, FileSpec, Logger, LoggerHandle};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use strum_macros::{Display, EnumString};

static LOGGER_HANDLE: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

const CRATE_PREFIX: &str = "plugview::";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Ext,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log specification '{spec}': {cause}")]
    InvalidSpec { spec: String, cause: String },

    #[error("Invalid log file '{}': {}", .path, .cause)]
    InvalidFile { path: String, cause: String },

    #[error("Logger could not be started: {0}")]
    StartFailed(String),
}

impl crate::core::error_handling::ContextualError for LoggingError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            LoggingError::InvalidSpec { .. } | LoggingError::InvalidFile { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            LoggingError::InvalidSpec { .. } => Some("Invalid log level"),
            LoggingError::InvalidFile { .. } => Some("Invalid log file path"),
            _ => None,
        }
    }
}

/// Start the global logger
///
/// `level` is any `flexi_logger` spec (`info`, `debug,plugview::task=trace`)
/// and defaults to `info`.
pub fn init_logging(
    level: Option<&str>,
    format: LogFormat,
    file: Option<&Path>,
    color_enabled: bool,
) -> Result<(), LoggingError> {
    let spec = level.unwrap_or("info");
    let mut logger = Logger::try_with_str(spec).map_err(|e| LoggingError::InvalidSpec {
        spec: spec.to_string(),
        cause: e.to_string(),
    })?;

    // Colour only makes sense on a terminal.
    let color = color_enabled && file.is_none();
    logger = match (format, color) {
        (LogFormat::Json, _) => logger.format(json_format),
        (LogFormat::Ext, true) => logger.format(extended_color_format),
        (LogFormat::Ext, false) => logger.format(extended_format),
        (LogFormat::Text, true) => logger.format(text_color_format),
        (LogFormat::Text, false) => logger.format(text_format),
    };

    if let Some(path) = file {
        let file_spec = FileSpec::try_from(path).map_err(|e| LoggingError::InvalidFile {
            path: path.display().to_string(),
            cause: e.to_string(),
        })?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger
        .start()
        .map_err(|e| LoggingError::StartFailed(e.to_string()))?;
    if LOGGER_HANDLE.set(Mutex::new(handle)).is_err() {
        log::debug!("Logger handle already stored; keeping the first one");
    }
    Ok(())
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

fn level_colored(level: log::Level) -> colored::ColoredString {
    use colored::Colorize;

    let abbr = level_abbr(level);
    match level {
        log::Level::Error => abbr.red().bold(),
        log::Level::Warn => abbr.yellow(),
        log::Level::Info => abbr.green(),
        log::Level::Debug => abbr.blue(),
        log::Level::Trace => abbr.magenta(),
    }
}

fn text_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format(TIMESTAMP_FORMAT),
        level_abbr(record.level()),
        record.args()
    )
}

fn text_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {}",
        now.format(TIMESTAMP_FORMAT).to_string().dimmed(),
        level_colored(record.level()),
        record.args()
    )
}

fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format(TIMESTAMP_FORMAT),
        level_abbr(record.level()),
        record.args(),
        source_location(record.target(), record.line())
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {} ({})",
        now.format(TIMESTAMP_FORMAT).to_string().dimmed(),
        level_colored(record.level()),
        record.args(),
        source_location(record.target(), record.line()).dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let line = serde_json::json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": source_location(record.target(), record.line()),
    });

    match serde_json::to_string(&line) {
        Ok(json) => w.write_all(json.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

/// `plugview::task::manager` + line 12 -> `task/manager.rs:12`
fn source_location(target: &str, line: Option<u32>) -> String {
    let path = match target.strip_prefix(CRATE_PREFIX) {
        Some(module) => module.replace("::", "/") + ".rs",
        None => target.replace("::", "/"),
    };

    match line {
        Some(line) => format!("{}:{}", path, line),
        None => path,
    }
}
