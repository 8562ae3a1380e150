//! Test modules for the plugin system
//!
//! Shared mocks plus the loader/registry integration suites.

mod loading;
pub(crate) mod utils;
