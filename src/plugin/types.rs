//! Type definitions for the plugin system
//!
//! Core value types shared by plugins, the registry and the task manager:
//! lifecycle status, configuration, the image buffer and typed artifacts.

use serde::Deserialize;
use strum_macros::{Display, EnumIter, EnumString};

/// Image buffer exchanged with plugins (8-bit, three channels)
pub type Image = image::RgbImage;

/// An image with no pixels is treated as invalid input by every plugin
pub fn is_empty_image(image: &Image) -> bool {
    image.width() == 0 || image.height() == 0
}

/// Lifecycle status carried by every plugin instance
///
/// The status is advanced by the plugin itself. The task manager only
/// forwards it to observers and never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PluginStatus {
    Ready,
    Processing,
    Done,
    Error,
    Fatal,
    Timeout,
}

impl PluginStatus {
    /// Stable numeric code used on the status channel
    pub fn code(&self) -> i32 {
        match self {
            PluginStatus::Ready => 0,
            PluginStatus::Processing => 1,
            PluginStatus::Done => 2,
            PluginStatus::Error => 3,
            PluginStatus::Fatal => 4,
            PluginStatus::Timeout => 5,
        }
    }

    /// True for the failure states a plugin can report
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PluginStatus::Error | PluginStatus::Fatal | PluginStatus::Timeout
        )
    }
}

/// Parameters handed to a plugin at init and on update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub param1: String,
    pub param2: i32,
}

/// Colour space of an image artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ColorSpace {
    Rgb,
    Hsv,
}

/// Artifact stored by a plugin during `fetch`
///
/// Borrowed from the plugin; the borrow ends before the next `fetch` or
/// `deinit` can run.
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    Image { space: ColorSpace, image: &'a Image },
}

impl Artifact<'_> {
    /// Copy the artifact's pixels out of the plugin
    pub fn to_image(&self) -> Image {
        match self {
            Artifact::Image { image, .. } => (*image).clone(),
        }
    }
}

/// Listing row for a registered plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSummary {
    pub index: usize,
    pub name: String,
    pub status: PluginStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_codes_are_sequential() {
        for (expected, status) in PluginStatus::iter().enumerate() {
            assert_eq!(status.code(), expected as i32);
        }
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(PluginStatus::from_str("DONE").unwrap(), PluginStatus::Done);
        assert_eq!(PluginStatus::Timeout.to_string(), "timeout");
        assert!(PluginStatus::from_str("finished").is_err());
    }

    #[test]
    fn test_failure_states() {
        assert!(PluginStatus::Error.is_failure());
        assert!(PluginStatus::Fatal.is_failure());
        assert!(PluginStatus::Timeout.is_failure());
        assert!(!PluginStatus::Done.is_failure());
        assert!(!PluginStatus::Ready.is_failure());
    }

    #[test]
    fn test_default_config_is_empty() {
        let config = PluginConfig::default();
        assert!(config.param1.is_empty());
        assert_eq!(config.param2, 0);
    }

    #[test]
    fn test_empty_image_detection() {
        assert!(is_empty_image(&Image::new(0, 0)));
        assert!(is_empty_image(&Image::new(4, 0)));
        assert!(!is_empty_image(&Image::new(1, 1)));
    }
}
