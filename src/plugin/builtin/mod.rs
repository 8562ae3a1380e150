//! Built-in Plugin Implementations
//!
//! Plugins compiled into the binary. Each registers itself through the
//! `builtin!` macro so descriptor paths can be resolved to it.

pub mod api;
pub mod hsv;
