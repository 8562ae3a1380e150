//! Plugin Loader
//!
//! Reads the line-oriented plugin descriptor and turns every configured path
//! into a plugin instance. Shared libraries are not opened: a path is
//! resolved by its file stem against the builtin plugin registry, so
//! `plugins/libhsv_plugin.so`, `hsv_plugin.dll` and `hsv` all select the
//! builtin `hsv` plugin.
//!
//! Descriptor format, one entry per line:
//!
//! ```text
//! # anything that is not an entry is ignored
//! - pluginpath: ../plugins/libhsv_plugin.so
//! ```

use crate::plugin::builtin::api::find_builtin;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::ImagePlugin;
use crate::task::manager::TaskManager;
use std::path::{Path, PathBuf};

const ENTRY_PREFIX: &str = "- pluginpath:";

/// Parsed plugin descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// File the descriptor was read from, if any
    pub source: Option<PathBuf>,
    /// Plugin paths in declaration order, unresolved
    pub plugin_paths: Vec<PathBuf>,
}

impl PluginDescriptor {
    /// Parse descriptor text
    pub fn parse(text: &str) -> Self {
        let plugin_paths = text
            .lines()
            .map(str::trim)
            .filter_map(|line| line.strip_prefix(ENTRY_PREFIX))
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .collect();

        Self {
            source: None,
            plugin_paths,
        }
    }

    /// Read and parse a descriptor file
    pub async fn from_file(path: &Path) -> PluginResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PluginError::DescriptorError {
                path: path.to_path_buf(),
                cause: e.to_string(),
            })?;

        let mut descriptor = Self::parse(&text);
        descriptor.source = Some(path.to_path_buf());
        Ok(descriptor)
    }

    /// Plugin paths with relative entries joined onto `base_dir`
    pub fn resolve_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.plugin_paths
            .iter()
            .map(|path| {
                if path.is_relative() {
                    base_dir.join(path)
                } else {
                    path.clone()
                }
            })
            .collect()
    }

    /// Human-readable origin for log lines
    pub fn describe(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "<inline descriptor>".to_string(),
        }
    }
}

/// Derive the builtin id a plugin path refers to
pub fn plugin_id_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
    let stem = stem.strip_prefix("lib").unwrap_or(&stem);
    let stem = stem
        .strip_suffix("_plugin")
        .or_else(|| stem.strip_suffix("-plugin"))
        .or_else(|| stem.strip_suffix("plugin"))
        .unwrap_or(stem);

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Instantiate the plugin a path refers to
pub fn resolve_plugin(path: &Path) -> PluginResult<Box<dyn ImagePlugin>> {
    let id = plugin_id_from_path(path).ok_or_else(|| PluginError::LoadError {
        path: path.to_path_buf(),
        cause: "path has no usable file name".to_string(),
    })?;

    let entry = find_builtin(&id).ok_or_else(|| PluginError::LoadError {
        path: path.to_path_buf(),
        cause: format!("no plugin registered under id '{}'", id),
    })?;

    log::debug!("Resolved '{}' to builtin plugin '{}'", path.display(), entry.name);
    Ok((entry.factory)())
}

/// Replace the manager's plugin set with the plugins named by `descriptor`
///
/// Relative entries resolve against `base_dir`; the CLI passes the working
/// directory. Paths that cannot be resolved are logged and skipped. Returns
/// the number of plugins registered.
pub fn load_plugins(manager: &TaskManager, descriptor: &PluginDescriptor, base_dir: &Path) -> usize {
    manager.load_models(descriptor);

    let mut loaded = 0;
    for path in descriptor.resolve_paths(base_dir) {
        match resolve_plugin(&path) {
            Ok(plugin) => {
                manager.add_plugin(plugin);
                log::info!("Plugin loaded successfully: {}", path.display());
                loaded += 1;
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    if loaded == 0 {
        log::warn!("No plugins loaded from {}", descriptor.describe());
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let text = "\
plugins:
  - pluginpath: ../plugins/libhsv_plugin.so
  # comment
  - pluginpath:   /abs/other.so
  - pluginpath:
name: viewer
";
        let descriptor = PluginDescriptor::parse(text);
        assert_eq!(
            descriptor.plugin_paths,
            vec![
                PathBuf::from("../plugins/libhsv_plugin.so"),
                PathBuf::from("/abs/other.so"),
            ]
        );
        assert!(descriptor.source.is_none());
    }

    #[test]
    fn test_parse_keeps_colons_inside_paths() {
        let descriptor = PluginDescriptor::parse("- pluginpath: C:\\plugins\\hsv_plugin.dll");
        assert_eq!(
            descriptor.plugin_paths,
            vec![PathBuf::from("C:\\plugins\\hsv_plugin.dll")]
        );
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(PluginDescriptor::parse("").plugin_paths.is_empty());
        assert!(PluginDescriptor::parse("pluginpath: x").plugin_paths.is_empty());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let descriptor = PluginDescriptor::parse("- pluginpath: a.so\n- pluginpath: /b.so");
        let resolved = descriptor.resolve_paths(Path::new("/work"));
        assert_eq!(
            resolved,
            vec![PathBuf::from("/work/a.so"), PathBuf::from("/b.so")]
        );
    }

    #[test]
    fn test_plugin_id_from_path() {
        let cases = [
            ("plugins/libhsv_plugin.so", Some("hsv")),
            ("hsv_plugin.dll", Some("hsv")),
            ("libHSVPlugin.dylib", Some("hsv")),
            ("hsv", Some("hsv")),
            ("/x/libplugin.so", None),
        ];
        for (path, expected) in cases {
            assert_eq!(
                plugin_id_from_path(Path::new(path)).as_deref(),
                expected,
                "path {}",
                path
            );
        }
    }

    #[test]
    fn test_resolve_plugin() {
        let plugin = resolve_plugin(Path::new("../plugins/libhsv_plugin.so")).unwrap();
        assert_eq!(plugin.name(), "HSV Plugin");

        let err = resolve_plugin(Path::new("libyolo_plugin.so")).err().unwrap();
        assert!(matches!(err, PluginError::LoadError { .. }));
        assert!(err.to_string().contains("yolo"));
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let err = PluginDescriptor::from_file(Path::new("/definitely/not/here.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::DescriptorError { .. }));
    }
}
