//! CLI module containing argument parsing, settings and output formatting

pub mod args;
pub mod display;
pub mod settings;
