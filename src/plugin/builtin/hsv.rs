//! HSV Plugin - colour-space conversion
//!
//! Converts RGB input to HSV using the 8-bit convention shared by most
//! vision toolkits: hue is halved into `0..180`, saturation and value span
//! `0..=255`. `fetch` keeps the converted frame for `get`; `render_result`
//! writes it straight into the caller's buffer.

use crate::builtin;
use crate::plugin::error::{PluginError, PluginResult};
use crate::plugin::traits::ImagePlugin;
use crate::plugin::types::{is_empty_image, Artifact, ColorSpace, Image, PluginConfig, PluginStatus};
use image::Rgb;

const PLUGIN_NAME: &str = "HSV Plugin";

builtin!("hsv", PLUGIN_NAME, create);

fn create() -> Box<dyn ImagePlugin> {
    Box::new(HsvPlugin::new())
}

/// Stateful RGB to HSV converter
#[derive(Debug)]
pub struct HsvPlugin {
    hsv_image: Option<Image>,
    status: PluginStatus,
    config: PluginConfig,
}

impl HsvPlugin {
    pub fn new() -> Self {
        log::debug!("{} created", PLUGIN_NAME);
        Self {
            hsv_image: None,
            status: PluginStatus::Ready,
            config: PluginConfig::default(),
        }
    }

    fn reject_empty(&mut self, image: &Image, operation: &str) -> PluginResult<()> {
        if is_empty_image(image) {
            log::error!("{}: input image is empty in {}", PLUGIN_NAME, operation);
            self.status = PluginStatus::Error;
            return Err(PluginError::EmptyInput {
                plugin_name: PLUGIN_NAME.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for HsvPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HsvPlugin {
    fn drop(&mut self) {
        self.deinit();
    }
}

impl ImagePlugin for HsvPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn init(&mut self, config: &PluginConfig) {
        log::debug!("{} init", PLUGIN_NAME);
        self.config = config.clone();
        self.status = PluginStatus::Ready;
    }

    fn update_config(&mut self, config: &PluginConfig) {
        log::debug!("{} update_config", PLUGIN_NAME);
        self.config = config.clone();
    }

    fn deinit(&mut self) {
        log::debug!("{} deinit", PLUGIN_NAME);
        self.hsv_image = None;
        self.status = PluginStatus::Ready;
    }

    fn fetch(&mut self, image: &Image) -> PluginResult<()> {
        log::debug!("{} fetch", PLUGIN_NAME);
        self.reject_empty(image, "fetch")?;
        self.hsv_image = Some(rgb_to_hsv(image));
        self.status = PluginStatus::Done;
        Ok(())
    }

    fn get(&self) -> Option<Artifact<'_>> {
        self.hsv_image.as_ref().map(|image| Artifact::Image {
            space: ColorSpace::Hsv,
            image,
        })
    }

    fn render_result(&mut self, input: &Image, output: &mut Image) -> PluginResult<()> {
        log::debug!("{} render_result", PLUGIN_NAME);
        self.reject_empty(input, "render_result")?;
        *output = rgb_to_hsv(input);
        self.status = PluginStatus::Done;
        Ok(())
    }

    fn cleanup(&mut self) {
        log::debug!("{} cleanup", PLUGIN_NAME);
        self.hsv_image = None;
    }

    fn status(&mut self, status: PluginStatus, message: &str) {
        log::info!("{} status update ({}): {}", PLUGIN_NAME, status, message);
        self.status = status;
    }

    fn current_status(&self) -> PluginStatus {
        self.status
    }
}

/// Convert every pixel of an RGB image to 8-bit HSV
pub fn rgb_to_hsv(input: &Image) -> Image {
    let mut output = Image::new(input.width(), input.height());
    for (src, dst) in input.pixels().zip(output.pixels_mut()) {
        *dst = hsv_pixel(*src);
    }
    output
}

fn hsv_pixel(Rgb([r, g, b]): Rgb<u8>) -> Rgb<u8> {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let saturation = if max > 0.0 { delta * 255.0 / max } else { 0.0 };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    Rgb([
        ((hue / 2.0).round() as u8).min(179),
        saturation.round() as u8,
        max as u8,
    ])
}
