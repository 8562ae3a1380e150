//! Command line arguments
//!
//! Flags given here win over the settings file, which wins over built-in
//! defaults.

use crate::core::logging::LogFormat;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "plugview")]
#[command(about = "Run image-processing plugins one task at a time")]
#[command(version)]
#[command(after_help = "Without --render or --run the loaded plugins are listed.")]
pub struct Args {
    /// Settings file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Plugin descriptor listing `- pluginpath:` entries
    #[arg(short = 'p', long = "plugins", value_name = "FILE")]
    pub plugins: Option<PathBuf>,

    /// List loaded plugins and exit
    #[arg(long = "list")]
    pub list: bool,

    /// Render IMAGE through the selected plugins
    #[arg(long = "render", value_name = "IMAGE", conflicts_with = "run")]
    pub render: Option<PathBuf>,

    /// Plugin indices applied in order by --render (default: all)
    #[arg(short = 's', long = "select", value_name = "INDEX", action = ArgAction::Append)]
    pub select: Vec<usize>,

    /// Run one task on IMAGE through the scheduler
    #[arg(long = "run", value_name = "IMAGE")]
    pub run: Option<PathBuf>,

    /// Plugin index used by --run
    #[arg(short = 'm', long = "model", value_name = "INDEX", default_value_t = 0)]
    pub model: usize,

    /// Upper bound on task execution, in seconds
    #[arg(short = 't', long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Where to write the resulting image
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Log level or flexi_logger spec
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Force coloured output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Args {
    /// Parsed `--log-format`, if given
    pub fn log_format(&self) -> Option<LogFormat> {
        // value_parser restricts the accepted strings to valid formats
        self.log_format.as_deref().and_then(|f| f.parse().ok())
    }

    /// Colour decision: explicit flags first, then terminal detection
    pub fn use_color(&self) -> bool {
        use std::io::IsTerminal;

        if self.no_color {
            false
        } else {
            self.color || std::io::stdout().is_terminal()
        }
    }
}
