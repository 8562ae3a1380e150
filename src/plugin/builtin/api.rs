//! API for builtin plugin registration and discovery
//!
//! Builtin plugins register themselves with the `builtin!` macro. The loader
//! resolves descriptor paths against the ids collected here.

use crate::plugin::traits::ImagePlugin;

/// Entry for a builtin plugin in the compile-time registry
pub struct BuiltinPluginEntry {
    /// Short id matched against descriptor paths (`hsv` for `libhsv_plugin.so`)
    pub id: &'static str,
    /// Display name, identical to the instance's `name()`
    pub name: &'static str,
    pub factory: fn() -> Box<dyn ImagePlugin>,
}

impl std::fmt::Debug for BuiltinPluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinPluginEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

inventory::collect!(BuiltinPluginEntry);

/// Macro for registering builtin plugins
#[macro_export]
macro_rules! builtin {
    ($id:expr, $name:expr, $factory:expr) => {
        inventory::submit!($crate::plugin::builtin::api::BuiltinPluginEntry {
            id: $id,
            name: $name,
            factory: $factory,
        });
    };
}

/// Get all registered builtin plugins, sorted by id
pub fn builtin_plugins() -> Vec<&'static BuiltinPluginEntry> {
    let mut entries: Vec<&'static BuiltinPluginEntry> =
        inventory::iter::<BuiltinPluginEntry>().collect();
    entries.sort_by_key(|entry| entry.id);
    entries
}

/// Look up a builtin plugin by id (case-insensitive)
pub fn find_builtin(id: &str) -> Option<&'static BuiltinPluginEntry> {
    inventory::iter::<BuiltinPluginEntry>().find(|entry| entry.id.eq_ignore_ascii_case(id))
}
